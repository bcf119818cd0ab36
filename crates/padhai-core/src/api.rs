//! Read-only client for the curriculum backend.
//!
//! The backend's response envelopes drifted over time: newer endpoints wrap
//! payloads as `{"data": [...]}`, older ones used a named key
//! (`{"chapters": [...]}`) or returned the payload bare. All of that is
//! adapted in one place ([`normalize_list`] / [`normalize_item`]) so the
//! typed API below always sees the canonical shape.

use serde_json::Value;
use tracing::debug;

use crate::{
    error::{PadhaiError, Result},
    summarize::DEFAULT_API_URL,
    types::{Chapter, CurriculumRef},
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let base_url =
            std::env::var("PADHAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(ApiClient {
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn list_chapters(&self) -> Result<Vec<Chapter>> {
        let value = self.get_json("chapter").await?;
        deserialize_list(normalize_list(value, "chapters"))
    }

    pub async fn get_chapter(&self, id: &str) -> Result<Chapter> {
        let id = validate_object_id(id)?;
        let url = format!("{}/chapter/{id}", self.base_url);
        debug!(%url, "fetching chapter");
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PadhaiError::ChapterNotFound { id: id.to_string() });
        }
        let response = check_status(response).await?;
        let value: Value = response.json().await?;
        let chapter = serde_json::from_value(normalize_item(value))?;
        Ok(chapter)
    }

    pub async fn list_classes(&self) -> Result<Vec<CurriculumRef>> {
        let value = self.get_json("class").await?;
        deserialize_list(normalize_list(value, "classes"))
    }

    pub async fn list_subjects(&self) -> Result<Vec<CurriculumRef>> {
        let value = self.get_json("subject").await?;
        deserialize_list(normalize_list(value, "subjects"))
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "fetching list");
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = response.text().await.unwrap_or_default();
    Err(PadhaiError::RequestFailed {
        status: status.as_u16(),
        reason,
    })
}

/// Mongo-style object ID: 24 hex characters. Checked before the request
/// goes out so a typo fails fast with a clear message.
fn validate_object_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(id)
    } else {
        Err(PadhaiError::InvalidChapterId { id: id.to_string() })
    }
}

/// Reduce any known list envelope to a plain JSON array.
fn normalize_list(value: Value, legacy_key: &str) -> Value {
    let inner = match value {
        Value::Object(mut obj) => {
            if let Some(data) = obj.remove("data") {
                data
            } else if let Some(legacy) = obj.remove(legacy_key) {
                legacy
            } else {
                Value::Object(obj)
            }
        }
        other => other,
    };
    match inner {
        Value::Array(items) => Value::Array(items),
        Value::Null => Value::Array(Vec::new()),
        single => Value::Array(vec![single]),
    }
}

/// Reduce a single-item envelope (`{"data": {...}}` or bare) to the item.
fn normalize_item(value: Value) -> Value {
    match value {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data) => data,
            None => Value::Object(obj),
        },
        other => other,
    }
}

fn deserialize_list<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapter_json() -> Value {
        json!({
            "_id": "0123456789abcdef01234567",
            "title": "Photosynthesis",
            "content": "# Photosynthesis\n\nPlants make food from light.",
            "yt_links": [
                {"_id": "a", "title": "Intro", "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "description": ""}
            ],
            "class_details": {"_id": "c", "title": "Class 10"},
            "subject_details": {"_id": "s", "title": "Biology"},
            "createdAt": "2025-03-01T10:00:00.000Z"
        })
    }

    #[test]
    fn canonical_data_envelope_is_primary() {
        let value = normalize_list(json!({"data": [chapter_json()]}), "chapters");
        let chapters: Vec<Chapter> = deserialize_list(value).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Photosynthesis");
        assert_eq!(chapters[0].yt_links.len(), 1);
    }

    #[test]
    fn legacy_named_key_envelope_is_accepted() {
        let value = normalize_list(json!({"chapters": [chapter_json()]}), "chapters");
        let chapters: Vec<Chapter> = deserialize_list(value).unwrap();
        assert_eq!(chapters.len(), 1);
    }

    #[test]
    fn bare_array_is_accepted() {
        let value = normalize_list(json!([chapter_json(), chapter_json()]), "chapters");
        let chapters: Vec<Chapter> = deserialize_list(value).unwrap();
        assert_eq!(chapters.len(), 2);
    }

    #[test]
    fn bare_object_becomes_single_element_list() {
        let value = normalize_list(chapter_json(), "chapters");
        let chapters: Vec<Chapter> = deserialize_list(value).unwrap();
        assert_eq!(chapters.len(), 1);
    }

    #[test]
    fn null_and_missing_data_degrade_to_empty() {
        let value = normalize_list(json!({"data": null}), "chapters");
        let chapters: Vec<Chapter> = deserialize_list(value).unwrap();
        assert!(chapters.is_empty());
    }

    #[test]
    fn single_item_envelope_unwraps() {
        let chapter: Chapter =
            serde_json::from_value(normalize_item(json!({"data": chapter_json()}))).unwrap();
        assert_eq!(chapter.id, "0123456789abcdef01234567");
        let chapter: Chapter = serde_json::from_value(normalize_item(chapter_json())).unwrap();
        assert_eq!(chapter.subject_details.unwrap().title, "Biology");
    }

    #[test]
    fn object_ids_are_validated() {
        assert!(validate_object_id("0123456789abcdef01234567").is_ok());
        assert!(validate_object_id("  0123456789abcdef01234567  ").is_ok());
        assert!(matches!(
            validate_object_id("not-an-id"),
            Err(PadhaiError::InvalidChapterId { .. })
        ));
        assert!(matches!(
            validate_object_id("0123456789abcdef0123456"), // 23 chars
            Err(PadhaiError::InvalidChapterId { .. })
        ));
    }
}
