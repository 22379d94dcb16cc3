//! Typed schemas for the scraped input records and the processed outputs.
//!
//! Raw records arrive as loosely-shaped JSON from upstream scrapers. They are
//! parsed into [`RawRecord`] exactly once at the boundary; everything past
//! that point works with [`PaperContent`] and never touches untyped maps.

use serde::{Deserialize, Serialize};

use crate::summary::Summary;

/// A scraped paper record as produced by the upstream collectors.
///
/// Every field is optional in the wire format; absent fields default so a
/// sparse record still parses and is rejected later on content grounds
/// rather than schema grounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub data: RecordData,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub hyperlinks: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub scraper_id: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
}

/// The nested `data` object carrying the paper text itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordData {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A body section, which scrapers emit either as `{"text": "..."}` or as a
/// bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Section {
    Keyed { text: String },
    Plain(String),
}

impl Section {
    pub fn text(&self) -> &str {
        match self {
            Section::Keyed { text } => text,
            Section::Plain(text) => text,
        }
    }
}

/// The normalized view of one paper, derived once from a [`RawRecord`] and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperContent {
    pub title: String,
    pub abstract_text: String,
    pub full_text: String,
    pub category: String,
    pub author: String,
    pub url: String,
    pub timestamp: String,
}

/// Output record persisted for each successfully processed paper.
///
/// The long-form description and body content are deliberately dropped; the
/// summary replaces them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub category: String,
    pub scraper_id: String,
    pub website_url: String,
    pub timestamp: String,
    pub author: String,
    pub image_url: Option<String>,
    pub source_type: String,
    pub hyperlinks: Vec<String>,
    pub data: ProcessedData,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedData {
    pub headline: String,
}

impl ProcessedRecord {
    /// Builds the output object from the raw record plus the generated
    /// summary, carrying passthrough metadata unchanged.
    pub fn from_parts(record: &RawRecord, summary: Summary) -> Self {
        Self {
            category: record.category.clone().unwrap_or_default(),
            scraper_id: record.scraper_id.clone().unwrap_or_default(),
            website_url: record.website_url.clone().unwrap_or_default(),
            timestamp: record.timestamp.clone().unwrap_or_default(),
            author: record.author.clone().unwrap_or_default(),
            image_url: record.image_url.clone(),
            source_type: record.source_type.clone().unwrap_or_default(),
            hyperlinks: record.hyperlinks.clone(),
            data: ProcessedData {
                headline: record.data.headline.clone().unwrap_or_default(),
            },
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_parse_both_shapes() {
        let raw = r#"{
            "data": {
                "headline": "A Paper",
                "sections": [{"text": "first"}, "second"]
            }
        }"#;
        let record: RawRecord = serde_json::from_str(raw).unwrap();
        let texts: Vec<&str> = record.data.sections.iter().map(Section::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn sparse_record_parses_with_defaults() {
        let record: RawRecord = serde_json::from_str("{}").unwrap();
        assert!(record.data.headline.is_none());
        assert!(record.hyperlinks.is_empty());
    }

    #[test]
    fn output_drops_long_form_content() {
        let raw = r#"{
            "data": {"headline": "X", "description": "long body", "content": "even longer"},
            "author": "A",
            "category": "C",
            "hyperlinks": ["https://example.com/paper"]
        }"#;
        let record: RawRecord = serde_json::from_str(raw).unwrap();
        let processed = ProcessedRecord::from_parts(&record, Summary::fallback("X"));
        let value = serde_json::to_value(&processed).unwrap();
        assert_eq!(value["data"]["headline"], "X");
        assert!(value["data"].get("description").is_none());
        assert!(value["data"].get("content").is_none());
        assert_eq!(value["hyperlinks"][0], "https://example.com/paper");
    }
}
