//! Azure Speech REST backends.
//!
//! Both backends map HTTP failures onto the same cancellation codes the
//! speech SDK reports, so retry decisions stay independent of the transport.

pub mod recognizer;
pub mod synthesizer;

pub use recognizer::AzureRecognizer;
pub use synthesizer::AzureSynthesizer;

use crate::config::ServiceTarget;
use crate::defaults::TRANSCRIPTION_API_VERSION;
use crate::error::Result;
use crate::remote::CancellationDetails;
use reqwest::StatusCode;
use std::time::Duration;

/// Sent with every request.
pub fn user_agent() -> String {
    format!("speechcli/{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP client shared by all requests of one backend.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .build()?)
}

/// Fast transcription endpoint for `target`.
pub fn transcription_url(target: &ServiceTarget) -> String {
    let base = match target {
        ServiceTarget::Region(region) => {
            format!("https://{region}.api.cognitive.microsoft.com")
        }
        ServiceTarget::Endpoint(endpoint) => endpoint.trim_end_matches('/').to_string(),
    };
    format!(
        "{base}/speechtotext/transcriptions:transcribe?api-version={TRANSCRIPTION_API_VERSION}"
    )
}

/// Text-to-speech endpoint for `target`.
pub fn synthesis_url(target: &ServiceTarget) -> String {
    match target {
        ServiceTarget::Region(region) => {
            format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
        }
        ServiceTarget::Endpoint(endpoint) => {
            format!("{}/cognitiveservices/v1", endpoint.trim_end_matches('/'))
        }
    }
}

/// Cancellation reported for a non-success response.
pub fn cancellation_for_status(status: StatusCode, body: &str) -> CancellationDetails {
    let code = match status.as_u16() {
        400 => "BadRequest",
        401 | 403 => "AuthenticationFailure",
        408 | 504 => "ServiceTimeout",
        429 => "TooManyRequests",
        502 | 503 => "ConnectionFailure",
        _ => "ServiceError",
    };
    let mut details = format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string();
    let body = body.trim();
    if !body.is_empty() {
        details.push_str(": ");
        details.push_str(body);
    }
    CancellationDetails::new("Error", code, details)
}
