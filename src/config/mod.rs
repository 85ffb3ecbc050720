//! Pipeline & Resolver Configuration
//!
//! Immutable parameter snapshot consumed by each pipeline run, stored in
//! TOML format. Validation is explicit and fails fast: an inconsistent
//! bound is a configuration error, never silently clamped.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Full configuration: detection parameters plus resolver tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Detection pipeline parameters
    pub detection: DetectionParams,
    /// Region resolver policy and tables
    pub resolver: ResolverConfig,
}

/// Parameter Set for one detection run.
///
/// Shared read-only across a batch; every stage treats it as an immutable
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Lower Canny hysteresis threshold
    pub edge_min_threshold: u32,
    /// Upper Canny hysteresis threshold
    pub edge_max_threshold: u32,
    /// Structuring element width for closing/opening
    pub kernel_width: u32,
    /// Structuring element height for closing/opening
    pub kernel_height: u32,
    /// Whether to follow the closing with an opening pass (speckle removal)
    pub apply_opening: bool,
    /// Contour area lower bound (exclusive)
    pub min_area: f64,
    /// Contour area upper bound (exclusive)
    pub max_area: f64,
    /// Aspect ratio lower bound (exclusive), ratio is max(w,h)/min(w,h)
    pub min_aspect_ratio: f64,
    /// Aspect ratio upper bound (exclusive)
    pub max_aspect_ratio: f64,
    /// Solidity floor; candidates with solidity <= this are rejected
    pub min_solidity: f64,
    /// Keep at most this many candidates, largest area first
    pub max_candidates: usize,
    /// Padding in pixels around a candidate when cropping
    pub crop_padding: u32,
    /// Minimum crop height for OCR legibility; smaller crops are upscaled
    pub min_crop_height: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        // Defaults tuned for roadside photos of Indonesian plates.
        Self {
            edge_min_threshold: 50,
            edge_max_threshold: 200,
            kernel_width: 20,
            kernel_height: 8,
            apply_opening: true,
            min_area: 1500.0,
            max_area: 1_000_000.0,
            min_aspect_ratio: 2.0,
            max_aspect_ratio: 6.0,
            min_solidity: 0.6,
            max_candidates: 1,
            crop_padding: 30,
            min_crop_height: 50,
        }
    }
}

impl DetectionParams {
    /// Check internal consistency of all bounds.
    ///
    /// The pipeline assumes a validated Parameter Set; constructors call
    /// this before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.edge_min_threshold > self.edge_max_threshold {
            return Err(Error::Configuration(format!(
                "edge_min_threshold ({}) must not exceed edge_max_threshold ({})",
                self.edge_min_threshold, self.edge_max_threshold
            )));
        }
        if self.kernel_width == 0 || self.kernel_height == 0 {
            return Err(Error::Configuration(format!(
                "kernel size must be positive, got {}x{}",
                self.kernel_width, self.kernel_height
            )));
        }
        if self.min_area >= self.max_area {
            return Err(Error::Configuration(format!(
                "min_area ({}) must be less than max_area ({})",
                self.min_area, self.max_area
            )));
        }
        if self.min_area <= 0.0 {
            return Err(Error::Configuration(format!(
                "min_area must be positive, got {}",
                self.min_area
            )));
        }
        if self.min_aspect_ratio >= self.max_aspect_ratio {
            return Err(Error::Configuration(format!(
                "min_aspect_ratio ({}) must be less than max_aspect_ratio ({})",
                self.min_aspect_ratio, self.max_aspect_ratio
            )));
        }
        if self.min_aspect_ratio <= 0.0 {
            return Err(Error::Configuration(format!(
                "min_aspect_ratio must be positive, got {}",
                self.min_aspect_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.min_solidity) {
            return Err(Error::Configuration(format!(
                "min_solidity must be within [0, 1], got {}",
                self.min_solidity
            )));
        }
        if self.max_candidates == 0 {
            return Err(Error::Configuration(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which resolution policy maps plate text to a region label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverPolicy {
    /// Flat national prefix map, first match wins
    #[default]
    NationalPrefix,
    /// Hierarchical single-province letter-code map
    ProvinceCode,
}

/// One entry of the Policy A prefix table. Order in the list is the match
/// order; declare longer prefixes before the shorter ones they shadow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub region: String,
}

/// One entry of the Policy B letter-group table. A candidate letter matches
/// by set membership; the first group containing it wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterGroup {
    /// Letters belonging to this group, e.g. "ABC"
    pub letters: String,
    pub region: String,
}

/// A declared OCR-confusion rewrite applied before prefix testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub from: String,
    pub to: String,
}

/// Region resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Active policy
    pub policy: ResolverPolicy,
    /// Policy A table, tested in declared order
    pub prefix_rules: Vec<PrefixRule>,
    /// Policy B national prefix (e.g. "BE")
    pub province_prefix: String,
    /// Policy B letter-group table, tested in declared order
    pub letter_groups: Vec<LetterGroup>,
    /// OCR-confusion corrections applied before prefix testing
    pub corrections: Vec<Correction>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            policy: ResolverPolicy::NationalPrefix,
            // Longest-prefix-first so "B" cannot shadow "BE"/"BG".
            prefix_rules: [
                ("BE", "Lampung"),
                ("BG", "Palembang"),
                ("AB", "Yogyakarta"),
                ("D", "Bandung"),
                ("E", "Cirebon"),
                ("B", "Jakarta & Sekitar"),
                ("F", "Bogor"),
                ("L", "Surabaya"),
                ("H", "Semarang"),
            ]
            .into_iter()
            .map(|(prefix, region)| PrefixRule {
                prefix: prefix.to_string(),
                region: region.to_string(),
            })
            .collect(),
            province_prefix: "BE".to_string(),
            letter_groups: [
                ("ABC", "Kota Bandar Lampung"),
                ("EF", "Kabupaten Lampung Selatan"),
                ("GH", "Kabupaten Lampung Tengah"),
                ("JK", "Kabupaten Lampung Utara"),
                ("LM", "Kabupaten Tanggamus"),
                ("NP", "Kabupaten Tulang Bawang"),
                ("QR", "Kabupaten Lampung Timur"),
                ("ST", "Kabupaten Way Kanan"),
                ("UV", "Kabupaten Pesawaran"),
                ("WX", "Kabupaten Mesuji"),
                ("YZ", "Kabupaten Pesisir Barat & Tulang Bawang Barat"),
            ]
            .into_iter()
            .map(|(letters, region)| LetterGroup {
                letters: letters.to_string(),
                region: region.to_string(),
            })
            .collect(),
            corrections: vec![Correction {
                from: "8E".to_string(),
                to: "BE".to_string(),
            }],
        }
    }
}

impl ResolverConfig {
    /// Check the resolver tables are usable.
    ///
    /// Resolution compares against sanitized text (uppercase [A-Z0-9]),
    /// so a prefix outside that alphabet can never match and is rejected
    /// here instead of silently sending every plate to a sentinel.
    pub fn validate(&self) -> Result<()> {
        if self.policy == ResolverPolicy::ProvinceCode && self.province_prefix.is_empty() {
            return Err(Error::Configuration(
                "province_prefix must not be empty for the province_code policy".to_string(),
            ));
        }
        if !is_sanitized_alphabet(&self.province_prefix) {
            return Err(Error::Configuration(format!(
                "province_prefix {:?} must contain only uppercase letters and digits",
                self.province_prefix
            )));
        }
        for rule in &self.prefix_rules {
            if rule.prefix.is_empty() {
                return Err(Error::Configuration(format!(
                    "empty prefix for region {:?}",
                    rule.region
                )));
            }
            if !is_sanitized_alphabet(&rule.prefix) {
                return Err(Error::Configuration(format!(
                    "prefix {:?} for region {:?} must contain only uppercase letters and digits",
                    rule.prefix, rule.region
                )));
            }
        }
        for group in &self.letter_groups {
            if group.letters.is_empty() {
                return Err(Error::Configuration(format!(
                    "empty letter group for region {:?}",
                    group.region
                )));
            }
            if !is_sanitized_alphabet(&group.letters) {
                return Err(Error::Configuration(format!(
                    "letter group {:?} for region {:?} must contain only uppercase letters and digits",
                    group.letters, group.region
                )));
            }
        }
        Ok(())
    }
}

/// True when every character could appear in sanitized plate text.
fn is_sanitized_alphabet(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.resolver.validate()
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a TOML file.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
