//! Pre-submission validation of task messages.

use thiserror::Error;

use super::task::Task;

/// All problems found in a task message, in field order.
///
/// # Examples
///
/// ```
/// use tes_client::Task;
///
/// let err = Task::default().validate().unwrap_err();
/// assert_eq!(err.issues(), ["Task.Executors: at least one executor is required"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .issues.join("\n"))]
pub struct ValidationError {
    issues: Vec<String>,
}

impl ValidationError {
    /// The individual problems, one message per offending field.
    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

fn require_absolute(issues: &mut Vec<String>, field: String, path: &str) {
    if !path.starts_with('/') {
        issues.push(format!("{field}: must be an absolute path"));
    }
}

fn optional_absolute(issues: &mut Vec<String>, field: String, path: &str) {
    if !path.is_empty() {
        require_absolute(issues, field, path);
    }
}

impl Task {
    /// Check that this task is acceptable for submission.
    ///
    /// Rules:
    /// - at least one executor;
    /// - every executor has an image and a command; `workdir`, `stdin`,
    ///   `stdout` and `stderr`, when set, are absolute paths;
    /// - every input has an absolute path and exactly one of `url` or
    ///   `content`;
    /// - every output has a url and an absolute path;
    /// - every volume is an absolute path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.executors.is_empty() {
            issues.push("Task.Executors: at least one executor is required".to_string());
        }
        for (i, exec) in self.executors.iter().enumerate() {
            let prefix = format!("Task.Executors[{i}]");
            if exec.image.is_empty() {
                issues.push(format!("{prefix}.Image: required"));
            }
            if exec.command.is_empty() {
                issues.push(format!("{prefix}.Command: required"));
            }
            optional_absolute(&mut issues, format!("{prefix}.Workdir"), &exec.workdir);
            optional_absolute(&mut issues, format!("{prefix}.Stdin"), &exec.stdin);
            optional_absolute(&mut issues, format!("{prefix}.Stdout"), &exec.stdout);
            optional_absolute(&mut issues, format!("{prefix}.Stderr"), &exec.stderr);
        }

        for (i, input) in self.inputs.iter().enumerate() {
            let prefix = format!("Task.Inputs[{i}]");
            match (input.url.is_empty(), input.content.is_empty()) {
                (true, true) => issues.push(format!("{prefix}.Url: required")),
                (false, false) => issues.push(format!(
                    "{prefix}.Content: Url and Content are mutually exclusive"
                )),
                _ => {},
            }
            if input.path.is_empty() {
                issues.push(format!("{prefix}.Path: required"));
            } else {
                require_absolute(&mut issues, format!("{prefix}.Path"), &input.path);
            }
        }

        for (i, output) in self.outputs.iter().enumerate() {
            let prefix = format!("Task.Outputs[{i}]");
            if output.url.is_empty() {
                issues.push(format!("{prefix}.Url: required"));
            }
            if output.path.is_empty() {
                issues.push(format!("{prefix}.Path: required"));
            } else {
                require_absolute(&mut issues, format!("{prefix}.Path"), &output.path);
            }
        }

        for (i, volume) in self.volumes.iter().enumerate() {
            require_absolute(&mut issues, format!("Task.Volumes[{i}]"), volume);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::task::{Executor, TaskParameter};

    fn valid_task() -> Task {
        Task {
            executors: vec![Executor {
                image: "alpine".to_string(),
                command: vec!["echo".to_string(), "hello".to_string()],
                ..Executor::default()
            }],
            inputs: vec![TaskParameter {
                url: "s3://bucket/input.txt".to_string(),
                path: "/data/input.txt".to_string(),
                ..TaskParameter::default()
            }],
            outputs: vec![TaskParameter {
                url: "s3://bucket/output.txt".to_string(),
                path: "/data/output.txt".to_string(),
                ..TaskParameter::default()
            }],
            volumes: vec!["/scratch".to_string()],
            ..Task::default()
        }
    }

    #[test]
    fn valid_task_passes() {
        assert!(valid_task().validate().is_ok());
    }

    #[test]
    fn executor_requires_image_and_command() {
        let mut task = valid_task();
        task.executors[0] = Executor::default();
        let err = task.validate().unwrap_err();
        assert_eq!(
            err.issues(),
            [
                "Task.Executors[0].Image: required",
                "Task.Executors[0].Command: required"
            ]
        );
    }

    #[test]
    fn relative_stdio_paths_rejected() {
        let mut task = valid_task();
        task.executors[0].stdout = "out.log".to_string();
        task.executors[0].workdir = "/work".to_string();
        let err = task.validate().unwrap_err();
        assert_eq!(
            err.issues(),
            ["Task.Executors[0].Stdout: must be an absolute path"]
        );
    }

    #[test]
    fn input_url_and_content_exclusive() {
        let mut task = valid_task();
        task.inputs[0].content = "inline".to_string();
        let err = task.validate().unwrap_err();
        assert!(err.issues()[0].contains("mutually exclusive"));

        task.inputs[0].url.clear();
        assert!(task.validate().is_ok(), "content alone is a valid input");

        task.inputs[0].content.clear();
        let err = task.validate().unwrap_err();
        assert_eq!(err.issues(), ["Task.Inputs[0].Url: required"]);
    }

    #[test]
    fn outputs_and_volumes_checked() {
        let mut task = valid_task();
        task.outputs[0].url.clear();
        task.outputs[0].path = "relative".to_string();
        task.volumes.push("tmp".to_string());
        let err = task.validate().unwrap_err();
        assert_eq!(
            err.issues(),
            [
                "Task.Outputs[0].Url: required",
                "Task.Outputs[0].Path: must be an absolute path",
                "Task.Volumes[1]: must be an absolute path",
            ]
        );
    }

    #[test]
    fn display_joins_issues() {
        let err = ValidationError {
            issues: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "a\nb");
    }
}
