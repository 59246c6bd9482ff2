//! Error types for dataplane client operations.

use std::io;

/// Result type for dataplane client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding objects or talking to the dataplane.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error while reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O error tied to a specific source location.
    #[error("{location}: {source}")]
    SourceIo {
        /// The file, directory or URL being read.
        location: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A document named a kind the scheme does not know.
    #[error("unknown kind {kind:?}")]
    UnknownKind {
        /// The kind string found in the document.
        kind: String,
    },

    /// A kind was registered twice in the same scheme.
    #[error("kind {kind:?} is already registered")]
    DuplicateKind {
        /// The duplicated kind.
        kind: String,
    },

    /// A record's kind is not registered in the scheme it was checked against.
    #[error("kind {kind:?} is not registered")]
    UnregisteredKind {
        /// The kind of the record.
        kind: String,
    },

    /// `undecode` was called without a preceding successful `decode`.
    #[error("must decode before undecode")]
    UndecodeWithoutDecode,

    /// The stream ended between peeking a document's kind and decoding it.
    #[error("unexpected end of stream while decoding {kind}")]
    UnexpectedEof {
        /// The kind that was being decoded.
        kind: &'static str,
    },

    /// A source location uses a URL scheme that cannot be read.
    #[error("unsupported source {location:?}: only files, directories, file:// URLs and '-' are supported")]
    UnsupportedSource {
        /// The offending location.
        location: String,
    },

    /// `next_source` was called after the end marker was returned.
    #[error("sources already exhausted")]
    SourcesExhausted,

    /// The dispatch client does not handle this record's type.
    #[error("unsupported object {kind:?}")]
    UnsupportedObject {
        /// The kind of the record.
        kind: String,
    },

    /// Could not reach the dataplane service.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// The address that was dialed.
        address: String,
        /// The transport error.
        #[source]
        source: tonic::transport::Error,
    },

    /// Connecting to the dataplane service did not finish in time.
    #[error("timed out connecting to {address} after {seconds}s")]
    ConnectTimeout {
        /// The address that was dialed.
        address: String,
        /// The timeout that expired.
        seconds: u64,
    },

    /// The RPC itself failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] tonic::Status),

    /// RPC failure with operation context.
    #[error("{operation}: rpc error: {status}")]
    RpcWithContext {
        /// The operation that failed.
        operation: String,
        /// The gRPC status.
        status: tonic::Status,
    },

    /// The service answered with a non-zero embedded status.
    #[error("server error: {message} (code {code})")]
    Server {
        /// Status code reported by the service.
        code: u32,
        /// Message reported by the service.
        message: String,
    },

    /// Server error with operation context.
    #[error("{operation}: server error: {message} (code {code})")]
    ServerWithContext {
        /// The operation that failed.
        operation: String,
        /// Status code reported by the service.
        code: u32,
        /// Message reported by the service.
        message: String,
    },

    /// A response was missing a required field or carried malformed data.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Malformed address or prefix.
    #[error(transparent)]
    Addr(#[from] crate::util::addr::AddrError),

    /// Some records of a bulk run failed.
    #[error("{failed} of {total} objects failed")]
    Partial {
        /// Number of failed records.
        failed: usize,
        /// Number of records attempted.
        total: usize,
        /// Whether every failure was reported by the service.
        server: bool,
    },
}

impl Error {
    /// Add context to this error.
    ///
    /// Wraps RPC and server errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Rpc(status) => Self::RpcWithContext {
                operation: operation.into(),
                status,
            },
            Self::Server { code, message } => Self::ServerWithContext {
                operation: operation.into(),
                code,
                message,
            },
            other => other,
        }
    }

    /// Check if the dataplane service reported this error through its status.
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Server { .. } | Self::ServerWithContext { .. } => true,
            Self::Partial { server, .. } => *server,
            _ => false,
        }
    }

    /// Check if a bulk run may skip the failing record and continue.
    ///
    /// Service status errors and RPC statuses other than `Unavailable` only
    /// concern the record that was sent; everything else leaves the stream or
    /// the connection in an unknown state.
    pub fn is_per_record(&self) -> bool {
        match self {
            Self::Server { .. } | Self::ServerWithContext { .. } => true,
            Self::Rpc(status) | Self::RpcWithContext { status, .. } => {
                status.code() != tonic::Code::Unavailable
            }
            _ => false,
        }
    }

    /// Get the service status code if this is a server error.
    pub fn server_code(&self) -> Option<u32> {
        match self {
            Self::Server { code, .. } | Self::ServerWithContext { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Process exit code for this error: 2 for server errors, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_server_error() { 2 } else { 1 }
    }
}
