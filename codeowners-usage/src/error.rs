use std::io;

/// Errors that abort index construction or aggregation. Per-line and
/// per-instance problems are never reported through this type; see
/// [`crate::parser::ParseError`] and [`crate::aggregate::Unattributed`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read CODEOWNERS file {location}: {source}")]
    ManifestUnavailable {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed usage report: {message}")]
    MalformedReport { message: String },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn malformed_report(message: impl Into<String>) -> Self {
        Error::MalformedReport {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io {
                location: "usage report".to_owned(),
                source: err.into(),
            }
        } else {
            Error::malformed_report(err.to_string())
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
