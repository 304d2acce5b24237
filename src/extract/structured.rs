//! Structured-data (JSON-LD) extraction.
//!
//! Scans embedded `application/ld+json` blocks for a `HighSchool` entity and
//! lifts its canonical identity fields. Structured data is authoritative for
//! identity; its free-text `description` is only a secondary ranking source,
//! fed to the dispatcher when the HTML body yields nothing.

use anyhow::Result;
use serde::Deserialize;

use crate::html::{Document, clean_text};
use crate::model::{ErrorKind, ExtractionError, ExtractionMethod};

/// Confidence on identity fields lifted from structured data.
pub const STRUCTURED_IDENTITY_CONFIDENCE: f32 = 95.0;
/// Confidence on address fields lifted from structured data.
pub const STRUCTURED_ADDRESS_CONFIDENCE: f32 = 90.0;

/// Identity fields lifted from a `HighSchool` JSON-LD block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredProfile {
    pub name: Option<String>,
    pub telephone: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeField {
    One(String),
    Many(Vec<String>),
}

impl TypeField {
    fn is_high_school(&self) -> bool {
        match self {
            TypeField::One(t) => t == "HighSchool",
            TypeField::Many(ts) => ts.iter().any(|t| t == "HighSchool"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LdBlock {
    #[serde(rename = "@type")]
    entity_type: Option<TypeField>,
    name: Option<String>,
    telephone: Option<String>,
    location: Option<LdLocation>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LdLocation {
    address: Option<LdAddress>,
}

#[derive(Debug, Deserialize)]
struct LdAddress {
    #[serde(rename = "streetAddress")]
    street_address: Option<String>,
    #[serde(rename = "addressLocality")]
    address_locality: Option<String>,
    #[serde(rename = "addressRegion")]
    address_region: Option<String>,
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
}

/// Attempt to parse JSON and, on failure, include the serde path and a
/// short excerpt of the offending line.
fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner = err.inner();
            let (line, column) = (inner.line(), inner.column());
            let path = err.path().to_string();
            let excerpt = error_excerpt(body, line, column);

            let mut message = String::new();
            if !path.is_empty() && path != "." {
                message.push_str(&format!("at path '{path}': "));
            }
            message.push_str(&format!("{inner} (line {line} col {column}), near {excerpt}"));
            Err(anyhow::anyhow!(message))
        }
    }
}

/// A window of the offending line with the failure point marked inline by
/// `>>`. Works in characters so multi-byte content cannot split a boundary.
fn error_excerpt(body: &str, line: usize, column: usize) -> String {
    const CONTEXT_CHARS: usize = 12;

    let source_line: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or_default()
        .chars()
        .collect();
    if source_line.is_empty() {
        return "(empty line)".to_string();
    }

    let focus = column.saturating_sub(1).min(source_line.len() - 1);
    let window_start = focus.saturating_sub(CONTEXT_CHARS);
    let window_end = (focus + CONTEXT_CHARS).min(source_line.len());

    let before: String = source_line[window_start..focus].iter().collect();
    let from_failure: String = source_line[focus..window_end].iter().collect();
    format!("`{before}>>{from_failure}`")
}

fn cleaned(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}

/// Find the document's `HighSchool` entity, if any.
///
/// Unparseable blocks and non-school entities are skipped; a second school
/// block is reported as ambiguous and ignored in favor of the first.
pub fn extract(doc: &Document) -> (Option<StructuredProfile>, Vec<ExtractionError>) {
    let mut errors = Vec::new();
    let mut profile: Option<StructuredProfile> = None;

    for script in doc.select_all("script[type='application/ld+json']") {
        // Raw payload: entity decoding would corrupt JSON, and keeping the
        // original line structure keeps parse-error locations honest.
        let raw = script.raw_text();
        if raw.trim().is_empty() {
            continue;
        }

        let block: LdBlock = match parse_json_with_context(&raw) {
            Ok(block) => block,
            Err(e) => {
                errors.push(ExtractionError::new(
                    "structured_data",
                    ErrorKind::Parse,
                    ExtractionMethod::StructuredData,
                    format!("{e:#}"),
                ));
                continue;
            }
        };

        if !block.entity_type.as_ref().is_some_and(TypeField::is_high_school) {
            continue;
        }

        if profile.is_some() {
            errors.push(ExtractionError::new(
                "structured_data",
                ErrorKind::Ambiguous,
                ExtractionMethod::StructuredData,
                "multiple HighSchool blocks; keeping the first",
            ));
            continue;
        }

        let address = block.location.and_then(|l| l.address);
        profile = Some(StructuredProfile {
            name: cleaned(block.name),
            telephone: cleaned(block.telephone),
            street: cleaned(address.as_ref().and_then(|a| a.street_address.clone())),
            locality: cleaned(address.as_ref().and_then(|a| a.address_locality.clone())),
            region: cleaned(address.as_ref().and_then(|a| a.address_region.clone())),
            postal_code: cleaned(address.as_ref().and_then(|a| a.postal_code.clone())),
            description: block.description.map(|d| clean_text(&d)).filter(|d| !d.is_empty()),
        });
    }

    (profile, errors)
}
