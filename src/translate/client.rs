//! Remote translation service client.
//!
//! [`SpeechTranslator`] is the seam the session orchestrator talks through;
//! [`ApiTranslator`] is the production implementation speaking the service's
//! wire format:
//!
//! * `POST <base>/api/translate-audio` — multipart (`audio` bytes,
//!   `sourceLang`, `targetLang`) → `{translatedText, originalText?,
//!   audioUrl, detectedLang?}`.
//! * `POST <base>/api/translate-text` — JSON `{text, sourceLang,
//!   targetLang}` → `{translatedText}`.
//!
//! A 2xx body carrying an `error` field (plus optional `details`) is treated
//! exactly like a transport failure; so is a missing required field.  All
//! connection details come from [`ServiceConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::RecordedArtifact;
use crate::config::ServiceConfig;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors that can occur during a translation exchange.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service reported an application-level error in a 2xx body.
    #[error("service error: {0}")]
    Service(String),

    /// The response body could not be parsed as JSON.
    #[error("malformed response: {0}")]
    Parse(String),

    /// A required field was absent from the response.
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),

    /// The multipart payload could not be assembled.
    #[error("invalid request payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechTranslation
// ---------------------------------------------------------------------------

/// Successful result of one speech-to-speech exchange.
///
/// `audio_url` is returned exactly as the service sent it; resolve relative
/// references against the service base with [`resolve_audio_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechTranslation {
    /// Translated text in the target language.
    pub translated_text: String,
    /// Transcript of the input audio, when the service provides one.
    pub original_text: Option<String>,
    /// Reference to the synthesized audio — absolute or service-relative.
    pub audio_url: String,
    /// Wire code of the detected source language, when detection ran.
    pub detected_lang: Option<String>,
}

// ---------------------------------------------------------------------------
// SpeechTranslator trait
// ---------------------------------------------------------------------------

/// Async interface to the remote transcription/translation/synthesis
/// service.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn SpeechTranslator>`).
#[async_trait]
pub trait SpeechTranslator: Send + Sync {
    /// One speech-to-speech exchange: audio in, translated text + audio out.
    async fn translate_speech(
        &self,
        artifact: &RecordedArtifact,
        source_wire: &str,
        target_wire: &str,
    ) -> Result<SpeechTranslation, TranslateError>;

    /// Stateless text-only translation.
    async fn translate_text(
        &self,
        text: &str,
        source_wire: &str,
        target_wire: &str,
    ) -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// URL resolution
// ---------------------------------------------------------------------------

/// Resolve a service-returned audio reference against the service base.
///
/// Absolute references are used as-is; anything else is joined onto
/// `base_url` with exactly one slash between the parts.
pub fn resolve_audio_url(base_url: &str, audio_url: &str) -> String {
    if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
        return audio_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        audio_url.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Classify a raw `(status, body)` pair into parsed JSON or a failure.
///
/// Non-2xx → [`TranslateError::Status`]; unparsable body →
/// [`TranslateError::Parse`]; a 2xx body carrying an `error` field (plus
/// optional `details`) → [`TranslateError::Service`].
fn classify_response(status: u16, body: &str) -> Result<serde_json::Value, TranslateError> {
    if !(200..300).contains(&status) {
        return Err(TranslateError::Status {
            status,
            body: body.trim().to_string(),
        });
    }

    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TranslateError::Parse(e.to_string()))?;

    if let Some(message) = json["error"].as_str() {
        let full = match json["details"].as_str() {
            Some(details) => format!("{message}: {details}"),
            None => message.to_string(),
        };
        return Err(TranslateError::Service(full));
    }

    Ok(json)
}

/// Extract a [`SpeechTranslation`] from a classified response body.
///
/// `translatedText` and `audioUrl` are required; everything else is
/// optional.
fn speech_translation_from(json: &serde_json::Value) -> Result<SpeechTranslation, TranslateError> {
    let translated_text = json["translatedText"]
        .as_str()
        .ok_or(TranslateError::MissingField("translatedText"))?
        .to_string();
    let audio_url = json["audioUrl"]
        .as_str()
        .ok_or(TranslateError::MissingField("audioUrl"))?
        .to_string();

    Ok(SpeechTranslation {
        translated_text,
        original_text: json["originalText"].as_str().map(str::to_string),
        audio_url,
        detected_lang: json["detectedLang"].as_str().map(str::to_string),
    })
}

// ---------------------------------------------------------------------------
// ApiTranslator
// ---------------------------------------------------------------------------

/// Production [`SpeechTranslator`] over HTTP.
pub struct ApiTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl ApiTranslator {
    /// Build an `ApiTranslator` from the service config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the response body and run it through [`classify_response`].
    async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, TranslateError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        classify_response(status, &body)
    }
}

#[async_trait]
impl SpeechTranslator for ApiTranslator {
    async fn translate_speech(
        &self,
        artifact: &RecordedArtifact,
        source_wire: &str,
        target_wire: &str,
    ) -> Result<SpeechTranslation, TranslateError> {
        let file_part = reqwest::multipart::Part::bytes(artifact.bytes.clone())
            .file_name("recording.wav")
            .mime_str(&artifact.mime)
            .map_err(|e| TranslateError::Payload(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("audio", file_part)
            .text("sourceLang", source_wire.to_string())
            .text("targetLang", target_wire.to_string());

        let url = format!("{}/api/translate-audio", self.base_url);
        log::debug!("translate: POST {url} ({} → {})", source_wire, target_wire);

        let response = self.client.post(&url).multipart(form).send().await?;
        let json = Self::read_json(response).await?;
        speech_translation_from(&json)
    }

    async fn translate_text(
        &self,
        text: &str,
        source_wire: &str,
        target_wire: &str,
    ) -> Result<String, TranslateError> {
        let body = serde_json::json!({
            "text":       text,
            "sourceLang": source_wire,
            "targetLang": target_wire,
        });

        let url = format!("{}/api/translate-text", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;
        let json = Self::read_json(response).await?;

        json["translatedText"]
            .as_str()
            .map(str::to_string)
            .ok_or(TranslateError::MissingField("translatedText"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
