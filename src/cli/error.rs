use crate::core::config::ConfigError;
use crate::core::errors::CloudError;
use thiserror::Error;

/// Exit status for bad invocations.
pub const EXIT_USAGE: u8 = 2;
/// Exit status for every other failure.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("bad".into()).exit_code(), 2);
        assert_eq!(CliError::NotFound("Machine not found".into()).exit_code(), 1);
        assert_eq!(
            CliError::from(CloudError::Api {
                code: 431,
                text: "bad zone".into()
            })
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_display_passes_through_api_error() {
        let err = CliError::from(CloudError::Api {
            code: 432,
            text: "no such command".into(),
        });
        assert!(err.to_string().contains("no such command"));
    }
}
