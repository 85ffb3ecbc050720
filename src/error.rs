//! Error taxonomy for the detection core.
//!
//! Only malformed input and invalid configuration are reported to the
//! caller. Geometric edge cases (degenerate contours, zero-size rects) are
//! filtered inside the proposer, and an image with no surviving candidates
//! is a valid empty result, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The Parameter Set violates an internal consistency rule. Raised
    /// before the pipeline runs; bounds are never silently clamped.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Input bytes could not be decoded into an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Reading or writing a config/artifact file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file contents were not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config serialization failed (should not happen for well-formed types).
    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
