//! Detection pipeline
//!
//! One parameterized pipeline replaces the originals' duplicated entry
//! points: preprocess, edge extraction, morphology, region proposal, crop
//! normalization, recognition and region resolution, each stage a pure
//! function of its input and the Parameter Set. Stages allocate fresh
//! outputs, so a pipeline shared read-only across threads can process a
//! batch with no ordering dependency between images.

pub mod crop;
pub mod edges;
pub mod morphology;
pub mod preprocess;
pub mod propose;

use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::Result;
use crate::ocr::{self, RecognitionMode, RecognizedText, TextRecognizer};
use crate::report::{annotate, DetectionReport, PlateRecord};
use crate::resolver::RegionResolver;

/// Decode raw bytes into an image, surfacing a decode error before the
/// pipeline is invoked.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// The plate detection pipeline for one validated configuration snapshot.
pub struct PlatePipeline {
    config: AppConfig,
    resolver: RegionResolver,
    recognizer: Option<Box<dyn TextRecognizer>>,
    recognition_mode: RecognitionMode,
}

impl PlatePipeline {
    /// Build a pipeline, failing fast on an inconsistent configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let resolver = RegionResolver::new(config.resolver.clone())?;
        Ok(Self {
            config,
            resolver,
            recognizer: None,
            recognition_mode: RecognitionMode::SingleLine,
        })
    }

    /// Attach the external OCR collaborator. Without one, every record's
    /// text carries the unavailability marker.
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Set the layout hint forwarded to the recognizer.
    pub fn with_recognition_mode(mut self, mode: RecognitionMode) -> Self {
        self.recognition_mode = mode;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the full pipeline on one decoded image.
    ///
    /// Never fails for a well-formed image: zero candidates is a valid
    /// result, and a missing or erroring recognizer degrades each record
    /// to the unavailability marker.
    pub fn process(&self, image_name: &str, image: &DynamicImage) -> DetectionReport {
        let start = Instant::now();
        let params = &self.config.detection;
        let source = image.to_rgb8();

        let gray = preprocess::preprocess(image, preprocess::DEFAULT_SMOOTHING_KERNEL);
        let edge_map = edges::extract_edges(
            &gray,
            params.edge_min_threshold,
            params.edge_max_threshold,
        );
        let morphed_map = morphology::close_and_open(
            &edge_map,
            params.kernel_width,
            params.kernel_height,
            params.apply_opening,
        );
        let candidates = propose::propose_regions(&morphed_map, params);
        debug!(
            "{}: {} candidate region(s) after filtering",
            image_name,
            candidates.len()
        );

        let annotated = annotate(&source, &candidates);

        let records = candidates
            .iter()
            .enumerate()
            .map(|(i, cand)| {
                let crop_img = crop::extract_crop(
                    &source,
                    &cand.bounding_box,
                    params.crop_padding,
                    params.min_crop_height,
                );
                let text = match &self.recognizer {
                    Some(recognizer) => {
                        let prepared = crop::prepare_for_ocr(&crop_img);
                        ocr::recognize_text(recognizer.as_ref(), &prepared, self.recognition_mode)
                    }
                    None => RecognizedText::Unavailable,
                };
                let region = self.resolver.resolve_recognized(&text);
                PlateRecord {
                    plate_index: i + 1,
                    bounding_box: cand.bounding_box,
                    rotated_rect: cand.rotated_rect,
                    crop: crop_img,
                    text,
                    region,
                }
            })
            .collect::<Vec<_>>();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "{}: {} plate(s) in {} ms",
            image_name,
            records.len(),
            processing_time_ms
        );

        DetectionReport {
            image_name: image_name.to_string(),
            records,
            edge_map,
            morphed_map,
            annotated,
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionParams;
    use crate::ocr::{FixedRecognizer, MissingRecognizer};
    use crate::resolver::Resolution;
    use image::{Rgb, RgbImage};

    /// Dark background with one bright plate-like rectangle.
    fn synthetic_scene() -> DynamicImage {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([20, 20, 20]));
        for y in 60..100 {
            for x in 80..200 {
                img.put_pixel(x, y, Rgb([230, 230, 230]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn test_config() -> AppConfig {
        AppConfig {
            detection: DetectionParams {
                edge_min_threshold: 50,
                edge_max_threshold: 150,
                kernel_width: 20,
                kernel_height: 8,
                // The synthetic rect produces a thin edge ring that a
                // same-kernel opening would wipe out.
                apply_opening: false,
                min_area: 500.0,
                max_area: 100_000.0,
                min_aspect_ratio: 1.5,
                max_aspect_ratio: 8.0,
                min_solidity: 0.5,
                max_candidates: 3,
                crop_padding: 10,
                min_crop_height: 50,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = test_config();
        config.detection.min_area = 10_000.0;
        config.detection.max_area = 100.0;
        assert!(PlatePipeline::new(config).is_err());
    }

    #[test]
    fn test_synthetic_plate_is_detected() {
        let pipeline = PlatePipeline::new(test_config()).unwrap();
        let report = pipeline.process("scene.png", &synthetic_scene());

        assert_eq!(report.plates_found(), 1);
        let bb = &report.records[0].bounding_box;
        // The detected box should sit on the drawn rectangle, give or
        // take edge-localization slack.
        assert!(bb.x >= 70 && bb.x <= 90, "x = {}", bb.x);
        assert!(bb.y >= 50 && bb.y <= 70, "y = {}", bb.y);
        assert!(bb.width >= 100 && bb.width <= 140, "w = {}", bb.width);
        assert!(bb.height >= 30 && bb.height <= 55, "h = {}", bb.height);

        // Artifacts keep source dimensions.
        assert_eq!(report.edge_map.dimensions(), (320, 240));
        assert_eq!(report.morphed_map.dimensions(), (320, 240));
        assert_eq!(report.annotated.dimensions(), (320, 240));
    }

    #[test]
    fn test_blank_image_yields_empty_report() {
        let pipeline = PlatePipeline::new(test_config()).unwrap();
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(160, 120, Rgb([77, 77, 77])));
        let report = pipeline.process("blank.png", &blank);
        assert_eq!(report.plates_found(), 0);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let pipeline = PlatePipeline::new(test_config()).unwrap();
        let scene = synthetic_scene();
        let a = pipeline.process("scene.png", &scene);
        let b = pipeline.process("scene.png", &scene);

        assert_eq!(a.plates_found(), b.plates_found());
        for (ra, rb) in a.records.iter().zip(b.records.iter()) {
            assert_eq!(ra.bounding_box, rb.bounding_box);
            assert_eq!(ra.text, rb.text);
            assert_eq!(ra.region, rb.region);
        }
        assert_eq!(a.edge_map.as_raw(), b.edge_map.as_raw());
        assert_eq!(a.morphed_map.as_raw(), b.morphed_map.as_raw());
    }

    #[test]
    fn test_recognizer_output_resolves_region() {
        let pipeline = PlatePipeline::new(test_config())
            .unwrap()
            .with_recognizer(Box::new(FixedRecognizer::new("BE 1234 A")));
        let report = pipeline.process("scene.png", &synthetic_scene());

        assert_eq!(report.plates_found(), 1);
        assert_eq!(
            report.records[0].text,
            RecognizedText::Text("BE1234A".to_string())
        );
        // Default policy is the flat national map.
        assert_eq!(
            report.records[0].region,
            Resolution::Region("Lampung".to_string())
        );
    }

    #[test]
    fn test_unavailable_recognizer_degrades_gracefully() {
        let pipeline = PlatePipeline::new(test_config())
            .unwrap()
            .with_recognizer(Box::new(MissingRecognizer));
        let report = pipeline.process("scene.png", &synthetic_scene());

        assert_eq!(report.plates_found(), 1);
        for record in &report.records {
            assert_eq!(record.text, RecognizedText::Unavailable);
            assert_eq!(record.region, Resolution::TextEmpty);
        }
    }

    #[test]
    fn test_no_recognizer_marks_text_unavailable() {
        let pipeline = PlatePipeline::new(test_config()).unwrap();
        let report = pipeline.process("scene.png", &synthetic_scene());
        assert_eq!(report.records[0].text, RecognizedText::Unavailable);
    }

    #[test]
    fn test_crop_respects_legibility_floor() {
        let pipeline = PlatePipeline::new(test_config()).unwrap();
        let report = pipeline.process("scene.png", &synthetic_scene());
        let crop = &report.records[0].crop;
        assert!(crop.height() >= 50);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
