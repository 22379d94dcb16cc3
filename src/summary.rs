//! The structured summary object produced for every paper.

use serde::{Deserialize, Serialize};

/// Sentinel written into every field of a fallback summary.
pub const GENERATION_FAILED: &str = "Error generating summary.";

/// Audience-adaptive summary of one research paper.
///
/// The field set is fixed; the generation prompt instructs the model to
/// return exactly these eight keys, and cache entries hold exactly this
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Compelling, clear title capturing the essence of the research.
    pub headline: String,
    /// One-sentence summary anyone can understand.
    pub tldr: String,
    /// Why this research matters in the real world.
    pub context: String,
    /// The methods and approach used by the researchers.
    pub methodology: String,
    /// 3-5 bullet points with the main findings and implications.
    pub key_points: Vec<String>,
    /// A 2-3 paragraph explanation for a general audience.
    pub accessible_explanation: String,
    /// Broader impact and why the work represents an advance.
    pub significance: String,
    /// 2-3 thought-provoking questions the research raises.
    pub questions_raised: Vec<String>,
}

impl Summary {
    /// Degraded placeholder used when generation fails: the headline keeps
    /// the original title so the output record stays identifiable, every
    /// other field carries the fixed sentinel.
    pub fn fallback(title: &str) -> Self {
        Self {
            headline: title.to_string(),
            tldr: GENERATION_FAILED.to_string(),
            context: GENERATION_FAILED.to_string(),
            methodology: GENERATION_FAILED.to_string(),
            key_points: vec![GENERATION_FAILED.to_string()],
            accessible_explanation: GENERATION_FAILED.to_string(),
            significance: GENERATION_FAILED.to_string(),
            questions_raised: vec![GENERATION_FAILED.to_string()],
        }
    }
}
