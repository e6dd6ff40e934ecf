use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The schema-compilation capability failed; fatal for the process
    /// session, retrying against the same schema text cannot succeed.
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    /// The payload bytes do not conform to the wire schema. Per-request;
    /// other requests are unaffected.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Message type not found: {0}")]
    MessageTypeNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
