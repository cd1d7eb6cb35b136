//! Content negotiation -- pick a wire format from an `Accept` header.
//!
//! Candidates are ranked by their `q` weight (default `1.0`, also used when
//! the weight is malformed), highest first. Equal weights are ordered by the
//! media-type token, lexicographically, so the outcome for a given header is
//! always the same. The first candidate that maps to a known [`Format`] wins;
//! `*/*` maps to the default format.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, ViewError};

/// Wire formats the codec implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    /// Linked-data JSON; encoded exactly like [`Format::Json`].
    JsonLd,
    Xml,
    Csv,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Json, Format::JsonLd, Format::Xml, Format::Csv];

    /// Media type sent in the `Content-Type` response header.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::JsonLd => "application/ld+json",
            Format::Xml => "application/xml",
            Format::Csv => "text/csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::JsonLd => "jsonld",
            Format::Xml => "xml",
            Format::Csv => "csv",
        }
    }

    /// JSON variants carry a `Content-Length` header.
    pub fn is_json(self) -> bool {
        matches!(self, Format::Json | Format::JsonLd)
    }

    /// Map a media-type token to a format by keyword.
    pub fn from_media_type(token: &str) -> Option<Format> {
        let token = token.trim().to_ascii_lowercase();
        if token == "*/*" {
            Some(Format::default())
        } else if token.contains("ld+json") {
            Some(Format::JsonLd)
        } else if token.contains("json") {
            Some(Format::Json)
        } else if token.contains("xml") {
            Some(Format::Xml)
        } else if token.contains("csv") {
            Some(Format::Csv)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ViewError;

    /// Accepts a short name (`json`, `jsonld`, `json-ld`, `xml`, `csv`) or a
    /// media type.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "jsonld" | "json-ld" => Ok(Format::JsonLd),
            "xml" => Ok(Format::Xml),
            "csv" => Ok(Format::Csv),
            other if other.contains('/') => Format::from_media_type(other)
                .ok_or_else(|| ViewError::UnsupportedFormat(s.trim().to_string())),
            _ => Err(ViewError::UnsupportedFormat(s.trim().to_string())),
        }
    }
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub media_type: String,
    pub weight: f32,
}

/// Parse an `Accept` header into candidates sorted by preference.
pub fn preferences(accept: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = accept
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split(';');
            let media_type = parts.next()?.trim();
            if media_type.is_empty() {
                return None;
            }
            let weight = parts
                .filter_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("q")
                        .then(|| value.trim().parse::<f32>().ok())
                        .flatten()
                })
                .find(|q| q.is_finite())
                .unwrap_or(1.0);
            Some(MediaRange {
                media_type: media_type.to_string(),
                weight,
            })
        })
        .collect();

    // `sort_by` is stable.
    ranges.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.media_type.cmp(&b.media_type))
    });
    ranges
}

/// Resolve an `Accept` header to the response format.
///
/// # Errors
///
/// [`ViewError::NotAcceptable`] when no candidate maps to a known format.
pub fn resolve(accept: &str) -> Result<Format> {
    if accept.trim().is_empty() {
        return Ok(Format::default());
    }
    let format = preferences(accept)
        .iter()
        .find_map(|range| Format::from_media_type(&range.media_type))
        .ok_or_else(|| ViewError::NotAcceptable(accept.trim().to_string()))?;
    debug!(accept, format = %format, "negotiated response format");
    Ok(format)
}

/// Select the decode format from a `Content-Type` header.
///
/// Parameters such as `charset` are ignored; an empty header means the
/// default format.
///
/// # Errors
///
/// [`ViewError::UnsupportedFormat`] for media types the codec cannot read.
pub fn from_content_type(content_type: &str) -> Result<Format> {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    if media_type.is_empty() {
        return Ok(Format::default());
    }
    Format::from_media_type(media_type)
        .ok_or_else(|| ViewError::UnsupportedFormat(media_type.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_header_is_default() {
        assert_eq!(resolve("").unwrap(), Format::Json);
        assert_eq!(resolve("   ").unwrap(), Format::Json);
    }

    #[test]
    fn wildcard_is_default() {
        assert_eq!(resolve("*/*").unwrap(), Format::Json);
    }

    #[test]
    fn highest_weight_wins() {
        assert_eq!(
            resolve("application/json;q=0.4, application/xml;q=0.9").unwrap(),
            Format::Xml
        );
    }

    #[test]
    fn ties_break_lexicographically() {
        assert_eq!(
            resolve("application/xml;q=0.5, application/json;q=0.5").unwrap(),
            Format::Json
        );
        assert_eq!(resolve("text/csv, application/xml").unwrap(), Format::Xml);
    }

    #[test]
    fn malformed_weight_defaults_to_one() {
        let prefs = preferences("text/csv;q=abc, application/json;q=0.8");
        assert_eq!(prefs[0].media_type, "text/csv");
        assert_eq!(prefs[0].weight, 1.0);
        assert_eq!(resolve("application/json;q=0.8, text/csv;q=NaN").unwrap(), Format::Csv);
    }

    #[test]
    fn unknown_types_are_skipped() {
        assert_eq!(resolve("text/html, application/xml;q=0.1").unwrap(), Format::Xml);
    }

    #[test]
    fn nothing_known_is_not_acceptable() {
        let err = resolve("text/html, image/png").unwrap_err();
        assert!(matches!(err, ViewError::NotAcceptable(_)));
    }

    #[test]
    fn ld_json_is_distinct() {
        assert_eq!(resolve("application/ld+json").unwrap(), Format::JsonLd);
        assert_eq!(resolve("application/vnd.api+json").unwrap(), Format::Json);
    }

    #[test]
    fn content_type_ignores_parameters() {
        assert_eq!(from_content_type("application/xml; charset=utf-8").unwrap(), Format::Xml);
        assert_eq!(from_content_type("").unwrap(), Format::Json);
        assert!(matches!(
            from_content_type("text/plain"),
            Err(ViewError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("json-ld".parse::<Format>().unwrap(), Format::JsonLd);
        assert_eq!("text/csv".parse::<Format>().unwrap(), Format::Csv);
        assert!("yaml".parse::<Format>().is_err());
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
        }
    }
}
