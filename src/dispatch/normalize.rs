//! Result normalizer: one text payload per call.

use super::error::DispatchError;
use super::executor::ExecutionResult;

/// Fixed marker heading every error payload.
pub const ERROR_MARKER: &str = "ERROR:";
const STDERR_SEPARATOR: &str = "\n\nSTDERR:\n";

/// Normalized output handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// True only for dispatcher-level failures, never for a non-zero backend exit.
    pub is_error: bool,
}

pub fn success(result: &ExecutionResult) -> Normalized {
    let mut text = result.stdout.clone();
    if !result.stderr.is_empty() {
        text.push_str(STDERR_SEPARATOR);
        text.push_str(&result.stderr);
    }
    if !result.success() {
        match result.exit_code {
            Some(code) => text.push_str(&format!("\n\nEXIT_CODE: {code}")),
            None => text.push_str("\n\nEXIT_CODE: signal"),
        }
    }
    Normalized {
        text,
        is_error: false,
    }
}

/// `ERROR: [Kind] cause` on a single line.
pub fn failure(err: &DispatchError) -> Normalized {
    let cause = err
        .to_string()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Normalized {
        text: format!("{ERROR_MARKER} [{}] {cause}", err.kind()),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(code: Option<i32>, stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn stdout_only() {
        let n = success(&result(Some(0), "ROOT: /repo\n", ""));
        assert_eq!(n.text, "ROOT: /repo\n");
        assert!(!n.is_error);
    }

    #[test]
    fn stderr_appended_after_separator() {
        let n = success(&result(Some(0), "out\n", "warn\n"));
        assert_eq!(n.text, "out\n\n\nSTDERR:\nwarn\n");
    }

    #[test]
    fn nonzero_exit_surfaced_not_escalated() {
        let n = success(&result(Some(1), "", "no match\n"));
        assert!(!n.is_error);
        assert!(n.text.contains("STDERR:\nno match"));
        assert!(n.text.ends_with("EXIT_CODE: 1"));
    }

    #[test]
    fn errors_are_single_line_with_marker() {
        let err = DispatchError::invalid("grep", "pattern", "missing\nrequired parameter");
        let n = failure(&err);
        assert!(n.is_error);
        assert!(n.text.starts_with("ERROR: [InvalidArgument] "));
        assert!(!n.text.contains('\n'));
    }

    #[test]
    fn timeout_payload_names_budget() {
        let n = failure(&DispatchError::ExecutionTimeout {
            timeout: Duration::from_secs(60),
        });
        assert_eq!(
            n.text,
            "ERROR: [ExecutionTimeout] command timed out after 60 seconds"
        );
    }
}
