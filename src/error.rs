use thiserror::Error;

/// Errors that can occur while converting a recipe file
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Malformed JSON, gzip framing or text encoding
    #[error("Failed to decode recipe: {0}")]
    Decode(String),

    /// Missing or corrupt zip archive, or no recipe entries inside it
    #[error("Archive error: {0}")]
    Archive(String),

    /// No parser is registered for the file extension
    #[error(
        "No parser found for extension '{extension}'. Supported extensions are: {}",
        .supported.join(", ")
    )]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    /// Filesystem failure while reading input or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A batch worker failed to complete
    #[error("Conversion task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Decode(err.to_string())
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::Archive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let err = ConvertError::UnsupportedFormat {
            extension: "txt".to_string(),
            supported: vec!["crumb".to_string(), "paprikarecipe".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No parser found for extension 'txt'. Supported extensions are: crumb, paprikarecipe"
        );
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err: ConvertError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConvertError::Decode(_)));
    }
}
