use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML deserialization failed: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Source shape changed in sheet '{sheet}': {message}")]
    Schema { sheet: String, message: String },

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Bucket listing failed: {0}")]
    Listing(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
