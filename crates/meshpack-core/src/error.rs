//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Application spec not found: {path}")]
    SpecNotFound { path: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Failed to serialize values: {message}")]
    Serialize { message: String },

    #[error("Values document must be a mapping, found {found}")]
    NotAMapping { found: String },

    #[error("Layer '{layer}' is not declared by flavor '{flavor}'")]
    LayerNotFound { layer: String, flavor: String },

    #[error("No option selected for layer '{layer}'")]
    NoLayerSelection { layer: String },

    #[error("Option '{option}' not found on layer '{layer}'")]
    OptionNotFound { layer: String, option: String },

    #[error("Invalid manifest '{name}': {message}")]
    InvalidManifest { name: String, message: String },

    #[error("Archive error: {message}")]
    Archive { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
