//! Text cleaning, content extraction, and overlapping chunk splitting.

use regex::Regex;
use tracing::{debug, warn};

use crate::records::{PaperContent, RawRecord};

/// Texts below this length are passed through as a single chunk.
const MIN_SPLIT_LEN: usize = 100;

/// Splits normalized paper text into overlapping, bounded-length chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    noise: Regex,
    whitespace: Regex,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            noise: Regex::new(r#"[^\w\s.,!?()\-:;"'%]"#).expect("noise pattern is valid"),
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        }
    }

    /// Removes scraping noise: literal escape sequences, characters outside
    /// the common word/punctuation set, and runs of whitespace.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let text = text.replace("\\n", " ").replace("\\r", " ").replace("\\t", " ");
        let text = self.noise.replace_all(&text, " ");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Derives the normalized [`PaperContent`] view from a raw record.
    ///
    /// The abstract, body content, and section texts are cleaned and joined
    /// into `full_text`; metadata fields fall back to stable defaults so a
    /// sparse record still yields a well-formed value.
    pub fn extract_content(&self, record: &RawRecord) -> PaperContent {
        let title = record
            .data
            .headline
            .clone()
            .filter(|headline| !headline.is_empty())
            .unwrap_or_else(|| "Untitled Research Paper".to_string());

        let abstract_text = record
            .data
            .description
            .as_deref()
            .map(|description| self.clean(description))
            .unwrap_or_default();

        let mut full_text_parts = Vec::new();
        if !abstract_text.is_empty() {
            full_text_parts.push(abstract_text.clone());
        }
        if let Some(content) = record.data.content.as_deref() {
            let cleaned = self.clean(content);
            if !cleaned.is_empty() {
                full_text_parts.push(cleaned);
            }
        }
        for section in &record.data.sections {
            let cleaned = self.clean(section.text());
            if !cleaned.is_empty() {
                full_text_parts.push(cleaned);
            }
        }
        let full_text = full_text_parts.join(" ");

        if full_text == abstract_text {
            warn!(%title, "only abstract found for paper");
        }

        let author = record
            .author
            .clone()
            .filter(|author| author != "Unknown" && !author.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let category = record
            .category
            .clone()
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| "Scientific Research".to_string());
        let url = record.hyperlinks.first().cloned().unwrap_or_default();
        let timestamp = record.timestamp.clone().unwrap_or_default();

        PaperContent {
            title,
            abstract_text,
            full_text,
            category,
            author,
            url,
            timestamp,
        }
    }

    /// Splits text into chunks of at most `chunk_size` characters with
    /// `chunk_overlap` characters shared between neighbours.
    ///
    /// Cut points prefer whitespace so words stay intact, backtracking at
    /// most half a window before giving up and cutting mid-word.
    pub fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.len() < MIN_SPLIT_LEN {
            return vec![trimmed.to_string()];
        }

        let chars: Vec<char> = trimmed.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let mut cut = end;
            if end < chars.len() {
                let floor = start + self.chunk_size / 2;
                while cut > floor && !chars[cut - 1].is_whitespace() {
                    cut -= 1;
                }
                if cut == floor {
                    cut = end;
                }
            }

            let chunk: String = chars[start..cut].iter().collect();
            let chunk = chunk.trim().to_string();
            if !chunk.is_empty() {
                chunks.push(chunk);
            }

            if cut >= chars.len() {
                break;
            }
            start = cut.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        debug!(chunks = chunks.len(), "split text into chunks");
        chunks
    }
}
