//! On-demand study aids generated from chapter content.
//!
//! Each operation builds a deterministic prompt, asks the model for a JSON
//! array of a fixed shape, and coerces the free-text response into typed
//! records. Models routinely wrap JSON in commentary, so extraction is
//! deliberately lenient: the slice between the first `[` and the last `]`
//! is what gets parsed. Anything less recoverable than that is a
//! [`PadhaiError::GenerationParseError`], and callers substitute the fixed
//! fallback records so the learner never sees a raw failure.

use async_trait::async_trait;

use crate::{
    error::{PadhaiError, Result},
    provider::Provider,
    types::{GeneratedQuestion, QuizItem, Reference},
};

/// Prompt budget: only this much chapter content is embedded.
/// Truncation is silent and deterministic.
const MAX_CONTENT_BYTES: usize = 10_000;

/// The single capability this crate needs from a generative model:
/// prompt in, free text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// [`TextModel`] backed by a provider's chat-completions endpoint.
pub struct HttpTextModel {
    provider: Provider,
    api_key: String,
    http: reqwest::Client,
}

impl HttpTextModel {
    /// Fails early if the provider's API key is not configured.
    pub fn new(provider: Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(HttpTextModel {
            provider,
            api_key,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TextModel for HttpTextModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self.provider.config();

        let response = self
            .http
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.7,
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| PadhaiError::GenerationFailed {
                reason: format!("Invalid API response: {response:?}"),
            })?;

        Ok(content.to_string())
    }
}

/// Generate question/answer pairs for a chapter.
///
/// Answers start hidden; `revealed` is learner-controlled UI state.
pub async fn generate_questions(
    model: &dyn TextModel,
    content: &str,
    description: Option<&str>,
) -> Result<Vec<GeneratedQuestion>> {
    let prompt = format!(
        r#"Based on the following chapter content and description, generate 4 meaningful questions and their detailed answers:

{}CHAPTER CONTENT: {}

Format your response EXACTLY as a JSON array with objects containing 'question' and 'answer' properties:
[
  {{"question": "Question 1", "answer": "Answer to question 1"}},
  {{"question": "Question 2", "answer": "Answer to question 2"}},
  ...
]

Make sure the questions cover:
- Main concepts
- Connections to prior knowledge
- Practical applications
- Critical insights

DO NOT include any text before or after the JSON array. Return ONLY the properly formatted JSON array."#,
        description_block(description),
        bounded_excerpt(content),
    );

    let response = model.generate(&prompt).await?;
    let mut questions: Vec<GeneratedQuestion> = parse_json_array(&response)?;
    for q in &mut questions {
        q.revealed = false;
    }
    Ok(questions)
}

/// Generate suggested external references for a chapter.
pub async fn generate_references(
    model: &dyn TextModel,
    content: &str,
    description: Option<&str>,
) -> Result<Vec<Reference>> {
    let prompt = format!(
        r#"Based on the following chapter content and description, suggest 4 relevant academic resources or references that would complement this material:

{}CHAPTER CONTENT: {}

Format your response EXACTLY as a JSON array with objects containing 'title', 'description', and 'url' properties:
[
  {{"title": "Resource title", "description": "Brief description of the resource and its relevance", "url": "https://example.com/resource"}},
  {{"title": "Resource title", "description": "Brief description of the resource and its relevance", "url": "https://example.com/resource"}},
  ...
]

Include a mix of:
- Textbooks
- Academic articles
- Online courses
- Video lectures

For URLs, create plausible links to reputable sites like university domains, established publishers, or educational platforms.
DO NOT include any text before or after the JSON array. Return ONLY the properly formatted JSON array."#,
        description_block(description),
        bounded_excerpt(content),
    );

    let response = model.generate(&prompt).await?;
    parse_json_array(&response)
}

/// Generate a multiple-choice self-evaluation quiz for a chapter.
pub async fn generate_quiz(
    model: &dyn TextModel,
    content: &str,
    description: Option<&str>,
) -> Result<Vec<QuizItem>> {
    let prompt = format!(
        r#"Based on the following chapter content and description, create 3 multiple-choice questions to evaluate understanding:

{}CHAPTER CONTENT: {}

Format your response EXACTLY as a JSON array with objects containing 'question', 'options' (array of 4 strings), 'correctAnswer' (index 0-3), and 'explanation' properties:
[
  {{
    "question": "Question text",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 2,
    "explanation": "Explanation of why the correct answer is right"
  }},
  ...
]

Make sure:
- Questions test conceptual understanding, not just memorization
- Options are plausible but only one is clearly correct
- The explanation clarifies why the correct answer is right and others are wrong

DO NOT include any text before or after the JSON array. Return ONLY the properly formatted JSON array."#,
        description_block(description),
        bounded_excerpt(content),
    );

    let response = model.generate(&prompt).await?;
    let mut items: Vec<QuizItem> = parse_json_array(&response)?;
    for item in &mut items {
        if item.options.is_empty() || item.correct_answer >= item.options.len() {
            return Err(PadhaiError::GenerationParseError {
                reason: format!(
                    "correctAnswer {} out of range for {} options",
                    item.correct_answer,
                    item.options.len()
                ),
            });
        }
        item.selected = None;
    }
    Ok(items)
}

/// Answer a learner's free-form question about a chapter.
///
/// Plain prose, no JSON contract: 3-4 paragraphs grounded in the content.
pub async fn ask_question(
    model: &dyn TextModel,
    content: &str,
    question: &str,
    description: Option<&str>,
) -> Result<String> {
    let prompt = format!(
        r#"You're assisting a student who has asked a question about a chapter they're studying.

{}Chapter content (excerpt):
{}

Student's question:
{}

Answer the student's question specifically and concisely based on the chapter content.
If the answer isn't directly in the content, say so but provide the most relevant information.
Use clear, educational language and highlight key concepts.
Limit your answer to 3-4 paragraphs maximum."#,
        description_block_lower(description),
        bounded_excerpt(content),
        question,
    );

    let answer = model.generate(&prompt).await?;
    if answer.trim().is_empty() {
        return Err(PadhaiError::EmptyModelAnswer);
    }
    Ok(answer)
}

fn description_block(description: Option<&str>) -> String {
    match description {
        Some(d) if !d.trim().is_empty() => format!("CHAPTER DESCRIPTION: {d}\n\n"),
        _ => String::new(),
    }
}

fn description_block_lower(description: Option<&str>) -> String {
    match description {
        Some(d) if !d.trim().is_empty() => format!("Chapter description: {d}\n\n"),
        _ => String::new(),
    }
}

fn bounded_excerpt(content: &str) -> &str {
    if content.len() <= MAX_CONTENT_BYTES {
        return content;
    }
    let mut end = MAX_CONTENT_BYTES;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Slice the first `[` .. last `]` out of `text` and parse it as JSON.
///
/// This is the named recovery strategy for prose-wrapped model output, not
/// an accident: "Sure! Here you go:\n[...]" parses the same as bare JSON.
pub fn extract_json_array(text: &str) -> Result<&str> {
    let start = text.find('[').ok_or_else(|| PadhaiError::GenerationParseError {
        reason: "no JSON array found in model response".to_string(),
    })?;
    let end = text.rfind(']').ok_or_else(|| PadhaiError::GenerationParseError {
        reason: "unterminated JSON array in model response".to_string(),
    })?;
    if end < start {
        return Err(PadhaiError::GenerationParseError {
            reason: "brackets out of order in model response".to_string(),
        });
    }
    Ok(&text[start..=end])
}

fn parse_json_array<T: serde::de::DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let slice = extract_json_array(text)?;
    serde_json::from_str(slice).map_err(|e| PadhaiError::GenerationParseError {
        reason: e.to_string(),
    })
}

/// Fixed placeholder shown when question generation fails.
pub fn fallback_questions() -> Vec<GeneratedQuestion> {
    vec![GeneratedQuestion {
        question: "What are the main concepts covered in this chapter?".to_string(),
        answer: "The API couldn't generate specific questions. Try again or review the chapter content directly.".to_string(),
        revealed: false,
    }]
}

/// Fixed placeholder shown when reference generation fails.
pub fn fallback_references() -> Vec<Reference> {
    vec![Reference {
        title: "General Reference Guide".to_string(),
        description: "The API couldn't generate specific references. Try refreshing or search for resources related to this topic.".to_string(),
        url: "https://scholar.google.com".to_string(),
    }]
}

/// Fixed placeholder shown when quiz generation fails.
pub fn fallback_quiz() -> Vec<QuizItem> {
    vec![QuizItem {
        question: "Which concept is most central to this chapter?".to_string(),
        options: vec![
            "Please try regenerating the quiz".to_string(),
            "The API encountered an error".to_string(),
            "Refresh the page and try again".to_string(),
            "Contact support if the issue persists".to_string(),
        ],
        correct_answer: 0,
        explanation: "There was an error generating the quiz questions. Please try again.".to_string(),
        selected: None,
    }]
}
