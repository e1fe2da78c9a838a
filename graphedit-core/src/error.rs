use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unexpected end of item stream")]
    StreamExhausted,
    #[error("Bad document magic")]
    BadMagic,
    #[error("Unsupported document format version {0}")]
    UnsupportedVersion(u64),
    #[error("Unknown attribute value tag {0}")]
    UnknownValueTag(u8),
    #[error("Unknown item class tag {0}")]
    UnknownClassTag(u8),
    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
