use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoxMendError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Refinement error: {0}")]
    Refinement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl serde::Serialize for BoxMendError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type BoxMendResult<T> = Result<T, BoxMendError>;
