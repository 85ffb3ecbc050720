//! Per-image detection records and batch export
//!
//! The record list is what the persistence/UI collaborator consumes; the
//! edge map, morphed map and annotated original ride along as diagnostic
//! artifacts. Export formats mirror the original tabulation: a delimited
//! table (image, plate index, OCR text, region) and a JSON document.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;

use crate::ocr::RecognizedText;
use crate::pipeline::propose::{BoundingBox, CandidateRegion, RotatedRect};
use crate::resolver::Resolution;

/// One detected plate: geometry, crop, recognition and resolution.
#[derive(Debug, Clone, Serialize)]
pub struct PlateRecord {
    /// 1-based index within the image, largest candidate first
    pub plate_index: usize,
    pub bounding_box: BoundingBox,
    pub rotated_rect: RotatedRect,
    /// Normalized crop handed to the recognizer
    #[serde(skip)]
    pub crop: RgbImage,
    pub text: RecognizedText,
    pub region: Resolution,
}

/// Full result of one pipeline run over one image.
#[derive(Debug)]
pub struct DetectionReport {
    pub image_name: String,
    pub records: Vec<PlateRecord>,
    /// Binary edge map artifact
    pub edge_map: GrayImage,
    /// Post-morphology binary map artifact
    pub morphed_map: GrayImage,
    /// Input copy with candidate boxes drawn on
    pub annotated: RgbImage,
    pub processing_time_ms: u64,
}

impl DetectionReport {
    /// "No plate found" is a valid result, not an error.
    pub fn plates_found(&self) -> usize {
        self.records.len()
    }
}

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Draw candidate bounding boxes on a copy of the source image.
pub fn annotate(source: &RgbImage, candidates: &[CandidateRegion]) -> RgbImage {
    let mut annotated = source.clone();
    for cand in candidates {
        draw_box(&mut annotated, &cand.bounding_box);
    }
    annotated
}

fn draw_box(image: &mut RgbImage, bb: &BoundingBox) {
    let (img_w, img_h) = image.dimensions();
    for t in 0..BOX_THICKNESS {
        let x = bb.x.saturating_sub(t);
        let y = bb.y.saturating_sub(t);
        let w = (bb.width + 2 * t).min(img_w.saturating_sub(x));
        let h = (bb.height + 2 * t).min(img_h.saturating_sub(y));
        if w == 0 || h == 0 {
            continue;
        }
        draw_hollow_rect_mut(
            image,
            Rect::at(x as i32, y as i32).of_size(w, h),
            BOX_COLOR,
        );
    }
}

/// Batch-level statistics for the summary view.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub images_processed: usize,
    pub images_with_plates: usize,
    pub plates_found: usize,
    /// Share of images with at least one plate, in percent
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn from_reports(reports: &[DetectionReport]) -> Self {
        let images_processed = reports.len();
        let images_with_plates = reports.iter().filter(|r| r.plates_found() > 0).count();
        let plates_found = reports.iter().map(|r| r.plates_found()).sum();
        let success_rate = if images_processed > 0 {
            images_with_plates as f64 / images_processed as f64 * 100.0
        } else {
            0.0
        };
        Self {
            images_processed,
            images_with_plates,
            plates_found,
            success_rate,
        }
    }
}

/// Render the batch as a delimited table, one row per detected plate.
pub fn to_csv(reports: &[DetectionReport]) -> String {
    let mut out = String::from("image,plate,text,region\n");
    for report in reports {
        for record in &report.records {
            out.push_str(&format!(
                "{},{},{},{}\n",
                csv_field(&report.image_name),
                record.plate_index,
                csv_field(record.text.display()),
                csv_field(record.region.label()),
            ));
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
struct JsonImage<'a> {
    image: &'a str,
    plates_found: usize,
    records: &'a [PlateRecord],
}

/// Render the batch as a JSON document (records plus summary).
pub fn to_json(reports: &[DetectionReport]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct JsonBatch<'a> {
        summary: BatchSummary,
        images: Vec<JsonImage<'a>>,
    }

    let batch = JsonBatch {
        summary: BatchSummary::from_reports(reports),
        images: reports
            .iter()
            .map(|r| JsonImage {
                image: &r.image_name,
                plates_found: r.plates_found(),
                records: &r.records,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, text: RecognizedText, region: Resolution) -> PlateRecord {
        PlateRecord {
            plate_index: index,
            bounding_box: BoundingBox {
                x: 10,
                y: 20,
                width: 60,
                height: 20,
            },
            rotated_rect: RotatedRect {
                center: (40.0, 30.0),
                width: 60.0,
                height: 20.0,
                angle_degrees: 0.0,
            },
            crop: RgbImage::new(60, 20),
            text,
            region,
        }
    }

    fn report(name: &str, records: Vec<PlateRecord>) -> DetectionReport {
        DetectionReport {
            image_name: name.to_string(),
            records,
            edge_map: GrayImage::new(4, 4),
            morphed_map: GrayImage::new(4, 4),
            annotated: RgbImage::new(4, 4),
            processing_time_ms: 0,
        }
    }

    #[test]
    fn test_annotate_draws_on_copy() {
        let source = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let cand = CandidateRegion {
            bounding_box: BoundingBox {
                x: 20,
                y: 30,
                width: 40,
                height: 20,
            },
            rotated_rect: RotatedRect {
                center: (40.0, 40.0),
                width: 40.0,
                height: 20.0,
                angle_degrees: 0.0,
            },
            area: 800.0,
            aspect_ratio: 2.0,
            solidity: 1.0,
        };
        let annotated = annotate(&source, &[cand]);

        assert_eq!(annotated.get_pixel(20, 30), &Rgb([0, 255, 0]));
        // Source untouched.
        assert_eq!(source.get_pixel(20, 30), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_csv_one_row_per_plate() {
        let reports = vec![
            report(
                "a.jpg",
                vec![
                    record(
                        1,
                        RecognizedText::Text("BE1234A".to_string()),
                        Resolution::Region("Lampung".to_string()),
                    ),
                    record(2, RecognizedText::Text(String::new()), Resolution::TextEmpty),
                ],
            ),
            report("b.jpg", vec![]),
        ];

        let csv = to_csv(&reports);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + two plates, empty image adds none
        assert_eq!(lines[0], "image,plate,text,region");
        assert_eq!(lines[1], "a.jpg,1,BE1234A,Lampung");
        assert_eq!(lines[2], "a.jpg,2,,REGION_TEXT_EMPTY");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let reports = vec![report(
            "c.jpg",
            vec![record(
                1,
                RecognizedText::Text("BE1Z".to_string()),
                Resolution::Region("Foo, Bar".to_string()),
            )],
        )];
        let csv = to_csv(&reports);
        assert!(csv.contains("\"Foo, Bar\""));
    }

    #[test]
    fn test_unavailable_marker_in_csv() {
        let reports = vec![report(
            "d.jpg",
            vec![record(1, RecognizedText::Unavailable, Resolution::TextEmpty)],
        )];
        let csv = to_csv(&reports);
        assert!(csv.contains("OCR_UNAVAILABLE"));
    }

    #[test]
    fn test_batch_summary_rates() {
        let reports = vec![
            report(
                "a.jpg",
                vec![record(
                    1,
                    RecognizedText::Text("BE1A".to_string()),
                    Resolution::Region("Lampung".to_string()),
                )],
            ),
            report("b.jpg", vec![]),
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.images_processed, 2);
        assert_eq!(summary.images_with_plates, 1);
        assert_eq!(summary.plates_found, 1);
        assert!((summary.success_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_json_export_shape() {
        let reports = vec![report(
            "a.jpg",
            vec![record(
                1,
                RecognizedText::Text("BE1234A".to_string()),
                Resolution::Region("Lampung".to_string()),
            )],
        )];
        let json = to_json(&reports).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["images_processed"], 1);
        assert_eq!(value["images"][0]["image"], "a.jpg");
        assert_eq!(value["images"][0]["records"][0]["region"]["region"], "Lampung");
    }
}
