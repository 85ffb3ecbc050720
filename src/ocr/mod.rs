//! Text recognizer adapter
//!
//! The OCR engine itself is an external collaborator: a black-box that
//! takes a small crop, a character whitelist and a mode hint, and returns
//! a string or signals unavailability. This module owns the seam trait and
//! the post-processing: stripping everything outside [A-Z0-9] and keeping
//! "engine unavailable" distinct from "engine read nothing", so region
//! resolution can tell the two apart.

use image::GrayImage;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Characters the engine is asked to restrict itself to.
pub const CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Marker rendered in reports when the engine was not consulted.
pub const UNAVAILABLE_MARKER: &str = "OCR_UNAVAILABLE";

/// Hint forwarded to the engine about the expected text layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// One line of text (plates with a single text row)
    #[default]
    SingleLine,
    /// One word, no internal whitespace
    SingleWord,
}

/// The external engine failed or is missing.
#[derive(Debug, Clone)]
pub struct RecognizerUnavailable(pub String);

impl fmt::Display for RecognizerUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OCR engine unavailable: {}", self.0)
    }
}

impl std::error::Error for RecognizerUnavailable {}

/// The black-box text recognizer collaborator.
///
/// Implementations wrap a real engine (Tesseract, a remote service, ...);
/// the crate does not bundle one. `recognize` may block for an unbounded
/// time; a batch caller wanting timeouts wraps this call specifically.
pub trait TextRecognizer: Send + Sync {
    fn recognize(
        &self,
        crop: &GrayImage,
        whitelist: &str,
        mode: RecognitionMode,
    ) -> Result<String, RecognizerUnavailable>;
}

/// Outcome of one recognition attempt, post-sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum RecognizedText {
    /// Engine ran; text is sanitized and may be empty ("no legible text").
    Text(String),
    /// Engine missing or erroring; no recognition was attempted.
    Unavailable,
}

impl RecognizedText {
    /// Sanitized text if the engine ran, regardless of emptiness.
    pub fn text(&self) -> Option<&str> {
        match self {
            RecognizedText::Text(t) => Some(t),
            RecognizedText::Unavailable => None,
        }
    }

    /// Rendering used in tables and exports.
    pub fn display(&self) -> &str {
        match self {
            RecognizedText::Text(t) => t,
            RecognizedText::Unavailable => UNAVAILABLE_MARKER,
        }
    }
}

/// Run the recognizer on a prepared crop and sanitize its output.
///
/// An engine failure degrades to [`RecognizedText::Unavailable`] rather
/// than failing the batch.
pub fn recognize_text(
    recognizer: &dyn TextRecognizer,
    crop: &GrayImage,
    mode: RecognitionMode,
) -> RecognizedText {
    match recognizer.recognize(crop, CHAR_WHITELIST, mode) {
        Ok(raw) => RecognizedText::Text(sanitize(&raw)),
        Err(err) => {
            warn!("{}", err);
            RecognizedText::Unavailable
        }
    }
}

/// Uppercase and strip every character outside [A-Z0-9].
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| c.to_uppercase())
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Recognizer returning a fixed string; used in tests and demos.
#[derive(Debug, Clone, Default)]
pub struct FixedRecognizer {
    pub output: String,
}

impl FixedRecognizer {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
        }
    }
}

impl TextRecognizer for FixedRecognizer {
    fn recognize(
        &self,
        _crop: &GrayImage,
        _whitelist: &str,
        _mode: RecognitionMode,
    ) -> Result<String, RecognizerUnavailable> {
        Ok(self.output.clone())
    }
}

/// Recognizer standing in for a missing engine; always signals
/// unavailability.
#[derive(Debug, Clone, Default)]
pub struct MissingRecognizer;

impl TextRecognizer for MissingRecognizer {
    fn recognize(
        &self,
        _crop: &GrayImage,
        _whitelist: &str,
        _mode: RecognitionMode,
    ) -> Result<String, RecognizerUnavailable> {
        Err(RecognizerUnavailable("no engine configured".to_string()))
    }
}
