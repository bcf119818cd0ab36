use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::{PadhaiError, Result};

/// An opaque, URL-safe token identifying one source video.
///
/// The token is the canonical watch URL encoded with URL-safe base64
/// (`+` → `-`, `/` → `_`, padding stripped) so it can travel as a path
/// segment. Decoding always yields the exact URL that was encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference(String);

impl VideoReference {
    /// Build a reference from whatever the user pasted: a full watch URL,
    /// a share link, an embed/shorts URL, or a bare video ID.
    pub fn from_video_url(input: &str) -> Result<Self> {
        let id = extract_video_id(input).ok_or_else(|| PadhaiError::VideoUrlNotRecognized {
            url: input.to_string(),
        })?;
        Ok(Self::from_canonical_url(&canonical_watch_url(id)))
    }

    /// Encode an already-canonical URL verbatim.
    pub fn from_canonical_url(url: &str) -> Self {
        VideoReference(URL_SAFE_NO_PAD.encode(url.as_bytes()))
    }

    /// Wrap a token received from elsewhere (a link, a saved chapter).
    /// Validity is only established by [`VideoReference::decode`].
    pub fn from_token(token: impl Into<String>) -> Self {
        VideoReference(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Reverse the URL-safe encoding back to the source URL.
    ///
    /// Fails if the token is not valid unpadded URL-safe base64, is not
    /// UTF-8, or does not decode to an absolute http(s) URL.
    pub fn decode(&self) -> Result<String> {
        let bytes =
            URL_SAFE_NO_PAD
                .decode(self.0.as_bytes())
                .map_err(|e| PadhaiError::MalformedVideoReference {
                    token: self.0.clone(),
                    reason: e.to_string(),
                })?;
        let url =
            String::from_utf8(bytes).map_err(|_| PadhaiError::MalformedVideoReference {
                token: self.0.clone(),
                reason: "decoded bytes are not UTF-8".to_string(),
            })?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PadhaiError::MalformedVideoReference {
                token: self.0.clone(),
                reason: format!("decoded value is not a URL: {url:?}"),
            });
        }
        Ok(url)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn canonical_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Pull the 11-character video ID out of the common YouTube URL shapes.
pub fn extract_video_id(input: &str) -> Option<&str> {
    let input = input.trim();

    for marker in ["watch?v=", "youtu.be/", "/embed/", "/shorts/"] {
        if let Some(pos) = input.find(marker) {
            let rest = &input[pos + marker.len()..];
            let end = rest
                .find(|c: char| !is_id_char(c))
                .unwrap_or(rest.len());
            let id = &rest[..end];
            if id.len() == 11 {
                return Some(id);
            }
        }
    }

    // Bare video ID
    if input.len() == 11 && input.chars().all(is_id_char) {
        return Some(input);
    }

    None
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
