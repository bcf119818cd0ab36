use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{PadhaiError, Result},
    types::{ProgressUpdate, Stage, SummaryRequest, SummaryResult, SummarySource},
};

/// Backend base URL used when `PADHAI_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://padhai-backend.onrender.com";

const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Wire payload for `POST /summarize`.
#[derive(Serialize)]
struct SummarizePayload<'a> {
    url: &'a str,
    language: &'a str,
    mode: &'a str,
    #[serde(rename = "aiModel")]
    ai_model: &'a str,
    class_id: &'a str,
    subject_id: &'a str,
    title: &'a str,
    description: &'a str,
}

/// One newline-delimited record from the summary stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRecord {
    Progress(ProgressUpdate),
    Complete {
        #[serde(default)]
        summary: Option<String>,
        #[serde(default)]
        source: Option<SummarySource>,
        #[serde(default)]
        warning: Option<String>,
    },
    Error {
        #[serde(default)]
        error: Option<String>,
    },
}

/// Error envelope the backend uses for non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Accumulates raw stream chunks and hands back complete lines.
///
/// The server may pack several records into one chunk or split a record
/// (even mid-UTF-8-character) across chunks, so bytes are buffered until a
/// newline is seen.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            match String::from_utf8(line) {
                Ok(s) if !s.trim().is_empty() => lines.push(s),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "dropping non-UTF-8 stream line"),
            }
        }
        lines
    }

    /// The final unterminated line once the stream has ended, if any.
    fn take_remainder(&mut self) -> Option<String> {
        if self.buf.iter().all(|b| b.is_ascii_whitespace()) {
            self.buf.clear();
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(line)
    }
}

/// Client for the summary-generation endpoint.
///
/// Drives one request at a time: sends the [`SummaryRequest`], forwards every
/// `progress` record to the caller's callback in arrival order, and resolves
/// exactly once with the `complete` payload (or an error). Dropping the
/// returned future aborts the transfer and releases the connection.
pub struct SummaryClient {
    http: reqwest::Client,
    base_url: String,
    stall_timeout: Duration,
}

impl SummaryClient {
    pub fn new() -> Result<Self> {
        let base_url =
            std::env::var("PADHAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(SummaryClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        })
    }

    /// How long the stream may go without delivering a single byte before
    /// the request is treated as stalled. A slow-but-flowing stream never
    /// trips this; only full silence does.
    pub fn stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Request a summary and stream progress into `on_progress`.
    ///
    /// The class/subject precondition and the video-reference decode both
    /// run before any network traffic.
    pub async fn summarize<F>(
        &self,
        request: &SummaryRequest,
        mut on_progress: F,
    ) -> Result<SummaryResult>
    where
        F: FnMut(ProgressUpdate),
    {
        if request.class_id.trim().is_empty() || request.subject_id.trim().is_empty() {
            return Err(PadhaiError::MissingCurriculumContext);
        }
        let video_url = request.video.decode()?;

        let payload = SummarizePayload {
            url: &video_url,
            language: &request.language,
            mode: request.mode.as_str(),
            ai_model: request.model.wire_name(),
            class_id: &request.class_id,
            subject_id: &request.subject_id,
            title: request.title.as_deref().unwrap_or(""),
            description: request.description.as_deref().unwrap_or(""),
        };

        debug!(url = %video_url, language = %request.language, "sending summary request");
        let response = self
            .http
            .post(format!("{}/summarize", self.base_url))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Failed to generate summary".to_string());
            return Err(PadhaiError::RequestFailed {
                status: status.as_u16(),
                reason,
            });
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut last_stage: Option<Stage> = None;

        loop {
            let next = tokio::time::timeout(self.stall_timeout, stream.next()).await;
            let chunk = match next {
                Err(_) => {
                    return Err(PadhaiError::StreamStalled {
                        idle: self.stall_timeout,
                    });
                }
                Ok(None) => break,
                Ok(Some(chunk)) => chunk?,
            };
            for line in lines.push(&chunk) {
                if let Some(result) = handle_line(&line, &mut last_stage, &mut on_progress)? {
                    // Remaining stream content is intentionally ignored;
                    // dropping `stream` here closes the connection.
                    return Ok(result);
                }
            }
        }

        // A well-behaved server terminates the completion record with a
        // newline, but tolerate one that ends the stream right after it.
        if let Some(line) = lines.take_remainder() {
            if let Some(result) = handle_line(&line, &mut last_stage, &mut on_progress)? {
                return Ok(result);
            }
        }

        Err(PadhaiError::RequestFailed {
            status: status.as_u16(),
            reason: "stream ended without a completion record".to_string(),
        })
    }
}

/// Process one stream line. Returns the final result on `complete`.
fn handle_line<F>(
    line: &str,
    last_stage: &mut Option<Stage>,
    on_progress: &mut F,
) -> Result<Option<SummaryResult>>
where
    F: FnMut(ProgressUpdate),
{
    let record: StreamRecord = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!(line = %line, error = %e, "unparseable stream record");
            return Ok(None);
        }
    };

    match record {
        StreamRecord::Progress(update) => {
            debug!(stage = ?update.stage, chunk = update.current_chunk, "progress");
            if let Some(prev) = *last_stage {
                if update.stage < prev {
                    warn!(from = ?prev, to = ?update.stage, "stage moved backwards");
                }
            }
            *last_stage = Some(update.stage);
            on_progress(update);
            Ok(None)
        }
        StreamRecord::Complete {
            summary,
            source,
            warning,
        } => {
            let summary = summary.unwrap_or_default();
            let warning = if summary.trim().is_empty() {
                warning.or_else(|| Some("The server returned an empty summary.".to_string()))
            } else {
                warning
            };
            Ok(Some(SummaryResult {
                summary,
                source,
                warning,
            }))
        }
        StreamRecord::Error { error } => Err(PadhaiError::GenerationFailed {
            reason: error.unwrap_or_else(|| "An error occurred".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{provider::Provider, types::SummaryMode, video::VideoReference};

    fn request() -> SummaryRequest {
        SummaryRequest {
            video: VideoReference::from_video_url("dQw4w9WgXcQ").unwrap(),
            language: "en".to_string(),
            mode: SummaryMode::Video,
            model: Provider::Gemini,
            class_id: "0123456789abcdef01234567".to_string(),
            subject_id: "76543210fedcba9876543210".to_string(),
            title: None,
            description: None,
        }
    }

    #[test]
    fn line_buffer_reassembles_split_records() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(b"{\"type\":\"progress\",").is_empty());
        let lines = buf.push(b"\"stage\":\"analyzing\"}\n{\"type\":");
        assert_eq!(lines, vec!["{\"type\":\"progress\",\"stage\":\"analyzing\"}"]);
        let lines = buf.push(b"\"complete\"}\n");
        assert_eq!(lines, vec!["{\"type\":\"complete\"}"]);
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn line_buffer_handles_multiple_records_per_chunk() {
        let mut buf = LineBuffer::default();
        let lines = buf.push(b"a\nb\r\nc\n\n");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn line_buffer_survives_utf8_split_across_chunks() {
        let mut buf = LineBuffer::default();
        let bytes = "{\"msg\":\"पढ़ाई\"}\n".as_bytes();
        let (head, tail) = bytes.split_at(9); // splits inside a Devanagari char
        assert!(buf.push(head).is_empty());
        let lines = buf.push(tail);
        assert_eq!(lines, vec!["{\"msg\":\"पढ़ाई\"}"]);
    }

    #[test]
    fn trailing_line_without_newline_is_recovered() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(b"{\"type\":\"complete\"}").is_empty());
        assert_eq!(
            buf.take_remainder().as_deref(),
            Some("{\"type\":\"complete\"}")
        );
    }

    #[test]
    fn progress_records_are_forwarded_in_order() {
        let mut seen = Vec::new();
        let mut last = None;
        for line in [
            r#"{"type":"progress","stage":"analyzing","currentChunk":0,"totalChunks":0,"message":"Analyzing video content..."}"#,
            r#"{"type":"progress","stage":"processing","currentChunk":1,"totalChunks":4,"message":"Processing chunk 1 of 4"}"#,
            r#"{"type":"progress","stage":"processing","currentChunk":2,"totalChunks":4,"message":"Processing chunk 2 of 4"}"#,
        ] {
            let out = handle_line(line, &mut last, &mut |u: ProgressUpdate| {
                seen.push((u.stage, u.current_chunk))
            })
            .unwrap();
            assert!(out.is_none());
        }
        assert_eq!(
            seen,
            vec![
                (Stage::Analyzing, 0),
                (Stage::Processing, 1),
                (Stage::Processing, 2)
            ]
        );
    }

    #[test]
    fn stage_regression_is_tolerated() {
        let mut last = Some(Stage::Finalizing);
        let out = handle_line(
            r#"{"type":"progress","stage":"analyzing","message":"again"}"#,
            &mut last,
            &mut |_| {},
        )
        .unwrap();
        assert!(out.is_none());
        assert_eq!(last, Some(Stage::Analyzing));
    }

    #[test]
    fn unparseable_line_is_skipped() {
        let mut last = None;
        let out = handle_line("not json at all", &mut last, &mut |_| {}).unwrap();
        assert!(out.is_none());
        // unknown record types are skipped the same way
        let out = handle_line(r#"{"type":"heartbeat"}"#, &mut last, &mut |_| {}).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn complete_record_resolves_with_summary() {
        let mut last = None;
        let result = handle_line(
            r##"{"type":"complete","summary":"# Notes","source":"youtube"}"##,
            &mut last,
            &mut |_| {},
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.summary, "# Notes");
        assert_eq!(result.source, Some(SummarySource::Youtube));
        assert_eq!(result.warning, None);
    }

    #[test]
    fn empty_summary_completes_with_warning() {
        let mut last = None;
        let result = handle_line(
            r#"{"type":"complete","summary":"","source":"cache"}"#,
            &mut last,
            &mut |_| {},
        )
        .unwrap()
        .unwrap();
        assert!(result.is_empty());
        assert!(result.warning.is_some());
    }

    #[test]
    fn error_record_fails_with_server_message() {
        let mut last = None;
        let err = handle_line(
            r#"{"type":"error","error":"no captions available"}"#,
            &mut last,
            &mut |_| {},
        )
        .unwrap_err();
        match err {
            PadhaiError::GenerationFailed { reason } => {
                assert_eq!(reason, "no captions available")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_curriculum_context_fails_before_any_request() {
        // Unroutable base URL: a network attempt would surface as ApiError,
        // so getting MissingCurriculumContext proves nothing was sent.
        let client = SummaryClient::with_base_url("http://127.0.0.1:1").unwrap();
        let mut req = request();
        req.class_id.clear();
        let err = client.summarize(&req, |_| {}).await.unwrap_err();
        assert!(matches!(err, PadhaiError::MissingCurriculumContext));
    }

    #[tokio::test]
    async fn malformed_reference_fails_before_any_request() {
        let client = SummaryClient::with_base_url("http://127.0.0.1:1").unwrap();
        let mut req = request();
        req.video = VideoReference::from_token("!!!not-base64!!!");
        let err = client.summarize(&req, |_| {}).await.unwrap_err();
        assert!(matches!(err, PadhaiError::MalformedVideoReference { .. }));
    }

    #[test]
    fn payload_uses_backend_field_names() {
        let payload = SummarizePayload {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            language: "en",
            mode: "podcast",
            ai_model: "groq",
            class_id: "c1",
            subject_id: "s1",
            title: "",
            description: "",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["aiModel"], "groq");
        assert_eq!(json["class_id"], "c1");
        assert_eq!(json["subject_id"], "s1");
        assert_eq!(json["mode"], "podcast");
    }
}
