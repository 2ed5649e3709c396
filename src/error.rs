use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
