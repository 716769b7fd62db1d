//! Process exit codes
//!
//! Scripts depend on these values; do not renumber.

use s3u_core::Error;

/// Exit status of an `s3u` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    UsageError = 2,
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
    UnsupportedFeature = 6,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a core error to the exit code reported for it
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Config(_) | Error::InvalidPath(_) => ExitCode::UsageError,
            Error::AliasNotFound(_) | Error::NotFound(_) | Error::FileNotFound(_) => {
                ExitCode::NotFound
            }
            Error::Auth(_) => ExitCode::AuthError,
            Error::Network(_) => ExitCode::NetworkError,
            Error::UnsupportedFeature(_) => ExitCode::UnsupportedFeature,
            Error::Command(_)
            | Error::Io(_)
            | Error::TomlDe(_)
            | Error::TomlSer(_)
            | Error::Json(_)
            | Error::General(_) => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::UnsupportedFeature.as_i32(), 6);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::Auth("denied".to_string())),
            ExitCode::AuthError
        );
        assert_eq!(
            ExitCode::from_error(&Error::FileNotFound(PathBuf::from("/tmp/x"))),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&Error::UnsupportedFeature("suffix".to_string())),
            ExitCode::UnsupportedFeature
        );
        assert_eq!(
            ExitCode::from_error(&Error::Command("gzip exited".to_string())),
            ExitCode::GeneralError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Config("bad hook".to_string())),
            ExitCode::UsageError
        );
    }
}
