use std::path::PathBuf;

/// Conditions that end a run without anything to download. They are caused by
/// the user's input or region, not by a fault, so the process exits cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailability {
    /// The geo service answered but has no territory for this site.
    OutOfService,
    /// The series exists but lists no seasons in the viewer's territory.
    Region { series_id: String },
    /// None of the requested subtitle languages is offered for a title.
    Languages { available: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request to {url} failed ({}): {body}", describe_status(.status))]
    Transport {
        url: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Login rejected: {0}")]
    Auth(String),

    #[error("Nothing to download: {0:?}")]
    Unavailable(Unavailability),

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} {path:?}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// `0` for user-correctable conditions, `1` for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Unavailable(_) => 0,
            _ => 1,
        }
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "no response".to_string(),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Subtitle assets were handed to the downloader.
    Dispatched { assets: usize },
    /// The run finished but selected nothing (filters excluded everything or
    /// a listing came back empty).
    Empty,
    /// See [`Unavailability`].
    Unavailable(Unavailability),
}

impl Outcome {
    pub fn from_asset_count(assets: usize) -> Self {
        if assets == 0 {
            Outcome::Empty
        } else {
            Outcome::Dispatched { assets }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let unavailable = Error::Unavailable(Unavailability::Languages {
            available: vec!["en".to_string()],
        });
        assert_eq!(unavailable.exit_code(), 0);
        assert_eq!(Error::Auth("bad password".to_string()).exit_code(), 1);
        let transport = Error::Transport {
            url: "https://example.com".to_string(),
            status: Some(503),
            body: "down".to_string(),
        };
        assert_eq!(transport.exit_code(), 1);
    }

    #[test]
    fn test_transport_message_without_status() {
        let error = Error::Transport {
            url: "https://example.com/geog".to_string(),
            status: None,
            body: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Request to https://example.com/geog failed (no response): connection refused"
        );
    }

    #[test]
    fn test_outcome_from_asset_count() {
        assert_eq!(Outcome::from_asset_count(0), Outcome::Empty);
        assert_eq!(
            Outcome::from_asset_count(6),
            Outcome::Dispatched { assets: 6 }
        );
    }
}
