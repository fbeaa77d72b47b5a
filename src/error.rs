//! Exit codes and machine-readable error reports.

use serde::Serialize;

use crate::cache::StoreError;
use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: scan completed (with or without duplicates)
/// - 1: unexpected failure
/// - 3: completed, but some files could not be read, hashed or cleaned
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed with non-fatal errors.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for an error returned by [`run_app`](crate::run_app).
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let interrupted = err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
            || err
                .downcast_ref::<StoreError>()
                .is_some_and(|e| matches!(e, StoreError::Interrupted));
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code prefix, e.g. "DS001"
    pub code: String,
    /// Process exit status
    pub exit_code: i32,
    /// Error chain, outermost context first
    pub message: String,
    /// Whether the run was stopped by Ctrl+C
    pub interrupted: bool,
}

impl StructuredError {
    /// Describe `err`, which ends the process with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
