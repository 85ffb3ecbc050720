//! plate-scout - classical license plate detection and region mapping
//!
//! Locates likely vehicle-license-plate regions in a photograph with
//! classical image processing (no learned model), crops them, optionally
//! runs an external OCR collaborator on each crop, and maps recognized
//! text to an administrative region via prefix rules.
//!
//! The pipeline is a chain of pure stages over an immutable parameter
//! snapshot: grayscale + smoothing, Canny edges, rectangular-kernel
//! morphology, contour filtering/ranking, crop normalization, recognition
//! and region resolution. See [`pipeline::PlatePipeline`] for the entry
//! point.

pub mod config;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod resolver;

pub use config::{AppConfig, DetectionParams, ResolverConfig, ResolverPolicy};
pub use error::{Error, Result};
pub use ocr::{RecognitionMode, RecognizedText, TextRecognizer};
pub use pipeline::{decode_image, PlatePipeline};
pub use report::{BatchSummary, DetectionReport, PlateRecord};
pub use resolver::{RegionResolver, Resolution};
