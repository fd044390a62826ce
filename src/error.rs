//! Error types for a sync run.

use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Remote endpoints the client talks to. Used to tag transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Token,
    ReadDir,
    MakeDir,
    Upload,
}

impl Endpoint {
    /// Path of the endpoint relative to the service base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Token => "/v2/token",
            Endpoint::ReadDir => "/v2/files/readdir",
            Endpoint::MakeDir => "/v2/files/mkdir",
            Endpoint::Upload => "/v2/files/upload",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Token => "token",
            Endpoint::ReadDir => "readdir",
            Endpoint::MakeDir => "mkdir",
            Endpoint::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Everything that can stop a run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable `{0}`")]
    MissingVar(&'static str),

    /// The token endpoint refused the credentials or answered with garbage.
    #[error("could not obtain access token ({status}): {detail}")]
    Credentials { status: StatusCode, detail: String },

    /// The request never produced an HTTP response.
    #[error("{endpoint} request failed")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered an upload with a status the run treats as fatal.
    #[error("upload of {file} rejected with {status}")]
    UploadRejected { file: String, status: StatusCode },

    /// A local file or directory could not be read.
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl SyncError {
    pub fn transport<E>(endpoint: Endpoint, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SyncError::Transport {
            endpoint,
            source: Box::new(source),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::MissingVar(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
