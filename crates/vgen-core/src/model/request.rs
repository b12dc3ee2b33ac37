//! Generation request: what the caller asks the backend to produce.

use serde::Serialize;
use thiserror::Error;

/// Shortest video the backend accepts, in seconds.
pub const MIN_DURATION_SECS: u32 = 10;
/// Longest video the backend accepts, in seconds.
pub const MAX_DURATION_SECS: u32 = 120;

/// Rejected request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("post id must not be empty")]
    EmptyPostId,
    #[error("duration {0}s is outside the accepted 10..=120 second range")]
    DurationOutOfRange(u32),
}

/// The source content a video is generated from. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub post_id: String,
    pub caption: String,
    pub image_url: String,
}

impl SourceRef {
    pub fn new(
        post_id: impl Into<String>,
        caption: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            caption: caption.into(),
            image_url: image_url.into(),
        }
    }
}

/// Knobs for the generated video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOptions {
    pub style: String,
    /// Target length in seconds.
    pub duration: u32,
    pub voice_type: String,
    pub include_captions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_style: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            style: "comedy".to_string(),
            duration: 30,
            voice_type: "male".to_string(),
            include_captions: true,
            music_style: None,
        }
    }
}

/// A validated, immutable generation request.
///
/// Serializes to the flat JSON body expected by `POST /generate-video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    #[serde(flatten)]
    source: SourceRef,
    #[serde(flatten)]
    options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(source: SourceRef, options: GenerationOptions) -> Result<Self, RequestError> {
        if source.post_id.trim().is_empty() {
            return Err(RequestError::EmptyPostId);
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&options.duration) {
            return Err(RequestError::DurationOutOfRange(options.duration));
        }
        Ok(Self { source, options })
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// JSON body for the submission endpoint.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
