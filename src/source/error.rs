// Wed Jan 21 2026 - Alex

use thiserror::Error;

/// Raised when a data source cannot be opened or read.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("IO error reading {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Source unreadable: {0}")]
    Unreadable(String),
}

impl SourceError {
    pub fn io(uri: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            SourceError::NotFound(uri.to_string())
        } else {
            SourceError::Io {
                uri: uri.to_string(),
                source,
            }
        }
    }
}
