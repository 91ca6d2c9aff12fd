use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevoiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Timing error: {0}")]
    Timing(String),

    #[error("Stretch planning error: {0}")]
    Planning(String),

    #[error("Stretch execution error: {0}")]
    Stretch(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, RevoiceError>;
