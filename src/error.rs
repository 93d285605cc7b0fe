use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or decoding an image source
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Image source not found: {0}")]
    NotFound(String),

    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {reference}: {source}")]
    Decode {
        reference: String,
        #[source]
        source: image::ImageError,
    },
}

/// User input rejected before it reaches the canvas model
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Zoom must be between 1% and {max}%, got {value}")]
    ZoomOutOfRange { value: i64, max: u32 },

    #[error("Zoom entry is not a whole number: {0:?}")]
    InvalidZoomEntry(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}

/// Errors that can occur during gesture state transitions
#[derive(Debug, Error, PartialEq)]
pub enum StateTransitionError {
    #[error("Cannot start {requested} while {active} is in progress")]
    GestureInProgress {
        active: &'static str,
        requested: &'static str,
    },
}

/// Whole-operation export failures; per-overlay load failures never surface here
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot export: no base image loaded")]
    NoBaseImage,

    #[error("An export is already in progress")]
    Busy,

    #[error("Failed to load base image: {0}")]
    BaseImage(#[source] LoadError),

    #[error("Failed to encode output image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to save output image: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading an editor configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors reading a scene manifest
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read scene file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid scene data: {0}")]
    Parse(#[from] serde_json::Error),
}
