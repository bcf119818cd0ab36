use serde::{Deserialize, Serialize};

use crate::{provider::Provider, video::VideoReference};

/// Languages a summary can be requested in, as (display name, code) pairs.
pub const AVAILABLE_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Hindi", "hi"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Bengali", "bn"),
    ("Marathi", "mr"),
    ("Gujarati", "gu"),
    ("Kannada", "kn"),
    ("Malayalam", "ml"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
];

/// Display name for a language code, falling back to English.
pub fn language_name(code: &str) -> &'static str {
    AVAILABLE_LANGUAGES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
        .unwrap_or("English")
}

/// How the generated summary should read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Written, section-by-section study notes.
    #[default]
    Video,
    /// Conversational, podcast-style narration.
    Podcast,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::Video => "video",
            SummaryMode::Podcast => "podcast",
        }
    }
}

/// Everything the backend needs to produce and persist one summary.
///
/// `class_id` and `subject_id` are mandatory: the backend files the finished
/// summary as a chapter under that class/subject pair, so a request without
/// them is rejected before any network traffic.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub video: VideoReference,
    pub language: String,
    pub mode: SummaryMode,
    pub model: Provider,
    pub class_id: String,
    pub subject_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Coarse phase reported while a summary is being generated.
///
/// The server is expected to move forward through these in order, but a
/// repeated or skipped stage is tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analyzing,
    Processing,
    Finalizing,
    Saving,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Analyzing,
        Stage::Processing,
        Stage::Finalizing,
        Stage::Saving,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Analyzing => "Analyzing video content",
            Stage::Processing => "Processing chunks",
            Stage::Finalizing => "Creating final summary",
            Stage::Saving => "Saving to history",
        }
    }
}

/// One progress record from the summary stream.
///
/// `current_chunk`/`total_chunks` only carry meaningful numbers during
/// [`Stage::Processing`]; other stages report zeros.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    pub stage: Stage,
    #[serde(rename = "currentChunk", default)]
    pub current_chunk: u32,
    #[serde(rename = "totalChunks", default)]
    pub total_chunks: u32,
    #[serde(default)]
    pub message: String,
}

impl ProgressUpdate {
    /// Percentage for the progress bar, 0 when totals are not yet known.
    pub fn percent(&self) -> u8 {
        if self.total_chunks == 0 {
            return 0;
        }
        ((self.current_chunk as f64 / self.total_chunks as f64) * 100.0).round() as u8
    }
}

/// Where the summary text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    /// Generated fresh from the platform's captions.
    Youtube,
    /// Served from the backend's summary cache.
    Cache,
}

impl SummarySource {
    pub fn label(&self) -> &'static str {
        match self {
            SummarySource::Youtube => "YouTube subtitles",
            SummarySource::Cache => "Cached summary",
        }
    }
}

/// Final outcome of a summary request.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    /// Markdown summary body. May be empty; see [`SummaryResult::warning`].
    pub summary: String,
    pub source: Option<SummarySource>,
    /// Soft failure note: set when the server completed with no text or
    /// attached its own warning. Rendered as a banner, never a hard error.
    pub warning: Option<String>,
}

impl SummaryResult {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
    }
}

/// A persisted chapter, owned and written by the backend. Read-only here.
#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub yt_links: Vec<VideoLink>,
    #[serde(default)]
    pub class_details: Option<CurriculumRef>,
    #[serde(default)]
    pub subject_details: Option<CurriculumRef>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// A video attached to a chapter.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoLink {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// A class or subject entry from the curriculum hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

/// A study question with a reveal-on-demand answer.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: String,
    /// Learner-controlled: whether the answer is currently shown.
    #[serde(default)]
    pub revealed: bool,
}

/// A suggested external resource for further reading.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// One multiple-choice self-evaluation item.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizItem {
    pub question: String,
    /// Always four options.
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    pub explanation: String,
    /// The learner's in-session pick; reset on regeneration.
    #[serde(default)]
    pub selected: Option<usize>,
}

impl QuizItem {
    pub fn is_correct(&self) -> bool {
        self.selected == Some(self.correct_answer)
    }
}
