//! Process exit codes
//!
//! A run that completes exits 0 even when individual copies failed; the
//! other codes are reserved for errors that stop the run.

use bcp_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments or configuration (also used by clap)
    UsageError = 2,
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
}

impl ExitCode {
    /// Exit code for an error that aborted the run
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Config(_) => ExitCode::UsageError,
            Error::Auth(_) => ExitCode::AuthError,
            Error::NotFound(_) => ExitCode::NotFound,
            Error::Network(_) | Error::Throttled(_) | Error::Timeout(_) => ExitCode::NetworkError,
            Error::Listing { source, .. } => ExitCode::from_error(source),
            Error::Io(_) | Error::General(_) => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
