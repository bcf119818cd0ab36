//! Padhai Core Library
//!
//! Core functionality for turning YouTube videos into curriculum-aligned
//! written summaries and generating AI-powered study aids (Q&A, references,
//! quizzes) from saved chapters.

pub mod api;
pub mod error;
pub mod format;
pub mod generate;
pub mod provider;
pub mod summarize;
pub mod types;
pub mod video;

// Re-export commonly used items at crate root
pub use api::ApiClient;
pub use error::{PadhaiError, Result};
pub use format::{
    format_chapter_readable, format_questions_readable, format_quiz_results_readable,
    format_references_readable, format_summary_readable,
};
pub use generate::{
    HttpTextModel, TextModel, ask_question, fallback_questions, fallback_quiz,
    fallback_references, generate_questions, generate_quiz, generate_references,
};
pub use provider::{Provider, ProviderConfig};
pub use summarize::{DEFAULT_API_URL, SummaryClient};
pub use types::{
    AVAILABLE_LANGUAGES, Chapter, CurriculumRef, GeneratedQuestion, ProgressUpdate, QuizItem,
    Reference, Stage, SummaryMode, SummaryRequest, SummaryResult, SummarySource, VideoLink,
    language_name,
};
pub use video::{VideoReference, canonical_watch_url, extract_video_id};
