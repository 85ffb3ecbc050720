//! Region resolution: plate text to administrative-region label
//!
//! Two policies, selected by configuration:
//!
//! * **Policy A**: flat national prefix map; entries tested in declared
//!   order, first match wins, so operators declare longer prefixes before
//!   the shorter ones they would otherwise shadow.
//! * **Policy B**: hierarchical single-province map: verify the national
//!   prefix, extract the letter following the digit run, then match it by
//!   set membership against the declared letter groups.
//!
//! Every input maps to exactly one region name or sentinel; resolution
//! never fails.

use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::config::{ResolverConfig, ResolverPolicy};
use crate::error::{Error, Result};
use crate::ocr::{sanitize, RecognizedText};

/// Sentinel: the recognizer produced no text (or was unavailable).
pub const REGION_TEXT_EMPTY: &str = "REGION_TEXT_EMPTY";
/// Sentinel: no Policy A prefix matched.
pub const REGION_UNKNOWN: &str = "REGION_UNKNOWN";
/// Sentinel: text does not carry the province's national prefix.
pub const REGION_NOT_IN_PROVINCE: &str = "REGION_NOT_IN_PROVINCE";
/// Sentinel: prefix matched but the letter code is absent or undeclared.
pub const REGION_CODE_UNKNOWN: &str = "REGION_CODE_UNKNOWN";

/// Outcome of resolving one plate text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "region")]
pub enum Resolution {
    /// Resolved to an administrative region
    Region(String),
    /// Empty text; the tables were never consulted
    TextEmpty,
    /// Policy A: no declared prefix matched
    Unknown,
    /// Policy B: national prefix missing
    NotInProvince,
    /// Policy B: letter code absent or in no declared group
    CodeUnknown,
}

impl Resolution {
    /// Region name, or the canonical sentinel string.
    pub fn label(&self) -> &str {
        match self {
            Resolution::Region(name) => name,
            Resolution::TextEmpty => REGION_TEXT_EMPTY,
            Resolution::Unknown => REGION_UNKNOWN,
            Resolution::NotInProvince => REGION_NOT_IN_PROVINCE,
            Resolution::CodeUnknown => REGION_CODE_UNKNOWN,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compiled resolver for one configuration snapshot.
pub struct RegionResolver {
    config: ResolverConfig,
    /// Policy B extraction: prefix, one-or-more digits, then a letter.
    letter_extract: Regex,
}

impl RegionResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let pattern = format!("{}[0-9]+([A-Z])", regex::escape(&config.province_prefix));
        let letter_extract = Regex::new(&pattern)
            .map_err(|e| Error::Configuration(format!("invalid province prefix: {}", e)))?;
        Ok(Self {
            config,
            letter_extract,
        })
    }

    /// Resolve raw plate text. The input is re-sanitized, so callers may
    /// pass engine output directly.
    pub fn resolve(&self, text: &str) -> Resolution {
        let text = sanitize(text);
        if text.is_empty() {
            return Resolution::TextEmpty;
        }
        match self.config.policy {
            ResolverPolicy::NationalPrefix => self.resolve_national(&text),
            ResolverPolicy::ProvinceCode => self.resolve_province(&text),
        }
    }

    /// Resolve a recognition outcome. An unavailable engine takes the
    /// empty-text sentinel path instead of failing the record.
    pub fn resolve_recognized(&self, recognized: &RecognizedText) -> Resolution {
        match recognized.text() {
            Some(text) => self.resolve(text),
            None => Resolution::TextEmpty,
        }
    }

    fn resolve_national(&self, text: &str) -> Resolution {
        for rule in &self.config.prefix_rules {
            if text.starts_with(&rule.prefix) {
                return Resolution::Region(rule.region.clone());
            }
        }
        Resolution::Unknown
    }

    fn resolve_province(&self, text: &str) -> Resolution {
        // Declared OCR-confusion rewrites, e.g. a misread "8E" for "BE".
        let mut text = text.to_string();
        for correction in &self.config.corrections {
            text = text.replace(&correction.from, &correction.to);
        }

        if !text.starts_with(&self.config.province_prefix) {
            return Resolution::NotInProvince;
        }

        let Some(letter) = self
            .letter_extract
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().chars().next())
        else {
            return Resolution::CodeUnknown;
        };

        for group in &self.config.letter_groups {
            if group.letters.contains(letter) {
                return Resolution::Region(group.region.clone());
            }
        }
        Resolution::CodeUnknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LetterGroup, PrefixRule};

    fn national() -> RegionResolver {
        RegionResolver::new(ResolverConfig::default()).unwrap()
    }

    fn province() -> RegionResolver {
        let config = ResolverConfig {
            policy: ResolverPolicy::ProvinceCode,
            ..Default::default()
        };
        RegionResolver::new(config).unwrap()
    }

    #[test]
    fn test_policy_a_basic_prefixes() {
        let r = national();
        assert_eq!(r.resolve("BE1234A"), Resolution::Region("Lampung".to_string()));
        assert_eq!(r.resolve("D5678XY"), Resolution::Region("Bandung".to_string()));
        assert_eq!(
            r.resolve("B999ZZ"),
            Resolution::Region("Jakarta & Sekitar".to_string())
        );
    }

    #[test]
    fn test_policy_a_longer_prefix_wins_over_shadowed_short() {
        let r = national();
        // "BG..." must hit Palembang, not the bare "B" Jakarta rule.
        assert_eq!(r.resolve("BG1111C"), Resolution::Region("Palembang".to_string()));
    }

    #[test]
    fn test_policy_a_declared_order_is_authoritative() {
        // A deliberately bad table with "B" first shadows "BE"; the
        // resolver must honor the declared order rather than fix it.
        let config = ResolverConfig {
            prefix_rules: vec![
                PrefixRule {
                    prefix: "B".to_string(),
                    region: "Jakarta & Sekitar".to_string(),
                },
                PrefixRule {
                    prefix: "BE".to_string(),
                    region: "Lampung".to_string(),
                },
            ],
            ..Default::default()
        };
        let r = RegionResolver::new(config).unwrap();
        assert_eq!(
            r.resolve("BE1234A"),
            Resolution::Region("Jakarta & Sekitar".to_string())
        );
    }

    #[test]
    fn test_policy_a_no_match_is_unknown() {
        let r = national();
        assert_eq!(r.resolve("Z9876Q"), Resolution::Unknown);
    }

    #[test]
    fn test_empty_text_short_circuits_both_policies() {
        assert_eq!(national().resolve(""), Resolution::TextEmpty);
        assert_eq!(province().resolve(""), Resolution::TextEmpty);
        assert_eq!(province().resolve("--- "), Resolution::TextEmpty);
    }

    #[test]
    fn test_policy_b_resolves_letter_group() {
        let r = province();
        assert_eq!(
            r.resolve("BE1234A"),
            Resolution::Region("Kota Bandar Lampung".to_string())
        );
        assert_eq!(
            r.resolve("BE42F"),
            Resolution::Region("Kabupaten Lampung Selatan".to_string())
        );
        assert_eq!(
            r.resolve("BE9Z"),
            Resolution::Region("Kabupaten Pesisir Barat & Tulang Bawang Barat".to_string())
        );
    }

    #[test]
    fn test_policy_b_rejects_foreign_prefix() {
        let r = province();
        assert_eq!(r.resolve("XY1234Z"), Resolution::NotInProvince);
        assert_eq!(r.resolve("B1234A"), Resolution::NotInProvince);
    }

    #[test]
    fn test_policy_b_ocr_confusion_correction() {
        let r = province();
        // "8E" misread for "BE" is rewritten before prefix testing.
        assert_eq!(
            r.resolve("8E1234A"),
            Resolution::Region("Kota Bandar Lampung".to_string())
        );
    }

    #[test]
    fn test_policy_b_missing_letter_is_code_unknown() {
        let r = province();
        // Sanitization strips the non-ASCII trailing glyph, leaving no
        // letter after the digit run.
        assert_eq!(r.resolve("BE1234Ø"), Resolution::CodeUnknown);
        assert_eq!(r.resolve("BE1234"), Resolution::CodeUnknown);
    }

    #[test]
    fn test_policy_b_undeclared_letter_is_code_unknown() {
        let config = ResolverConfig {
            policy: ResolverPolicy::ProvinceCode,
            letter_groups: vec![LetterGroup {
                letters: "ABC".to_string(),
                region: "Kota Bandar Lampung".to_string(),
            }],
            ..Default::default()
        };
        let r = RegionResolver::new(config).unwrap();
        assert_eq!(r.resolve("BE1234Q"), Resolution::CodeUnknown);
    }

    #[test]
    fn test_policy_b_noisy_input_is_sanitized_first() {
        let r = province();
        assert_eq!(
            r.resolve("be 1234-a"),
            Resolution::Region("Kota Bandar Lampung".to_string())
        );
    }

    #[test]
    fn test_unavailable_recognition_takes_empty_path() {
        let r = province();
        assert_eq!(
            r.resolve_recognized(&RecognizedText::Unavailable),
            Resolution::TextEmpty
        );
        assert_eq!(
            r.resolve_recognized(&RecognizedText::Text("BE1234A".to_string())),
            Resolution::Region("Kota Bandar Lampung".to_string())
        );
    }

    #[test]
    fn test_sentinel_labels() {
        assert_eq!(Resolution::TextEmpty.label(), "REGION_TEXT_EMPTY");
        assert_eq!(Resolution::Unknown.label(), "REGION_UNKNOWN");
        assert_eq!(Resolution::NotInProvince.label(), "REGION_NOT_IN_PROVINCE");
        assert_eq!(Resolution::CodeUnknown.label(), "REGION_CODE_UNKNOWN");
        assert_eq!(Resolution::Region("Lampung".to_string()).label(), "Lampung");
    }
}
