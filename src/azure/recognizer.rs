//! Recognition through the fast transcription REST endpoint.
//!
//! The endpoint returns every phrase of a file in one response. The
//! background task replays them as `Recognized` events, then reports
//! `SessionStopped`, so callers see the same stream a live session produces.

use super::{build_client, cancellation_for_status, transcription_url};
use crate::config::Credentials;
use crate::defaults::TICKS_PER_MILLISECOND;
use crate::error::{Result, SpeechError};
use crate::remote::CancellationDetails;
use crate::stt::recognizer::{EventSender, RecognitionEvent, RecognitionHandle, SpeechRecognizer};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptionResponse {
    #[serde(default)]
    phrases: Vec<Phrase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Phrase {
    #[serde(default)]
    offset_milliseconds: u64,
    #[serde(default)]
    duration_milliseconds: u64,
    #[serde(default)]
    text: String,
}

pub struct AzureRecognizer {
    client: reqwest::Client,
    key: String,
    url: String,
}

impl AzureRecognizer {
    pub fn new(credentials: &Credentials, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(request_timeout)?,
            key: credentials.key.clone(),
            url: transcription_url(&credentials.target),
        })
    }
}

impl SpeechRecognizer for AzureRecognizer {
    fn start_continuous(
        &self,
        audio: &Path,
        language: &str,
        events: EventSender,
    ) -> Result<RecognitionHandle> {
        if !audio.is_file() {
            return Err(SpeechError::InputNotFound {
                path: audio.display().to_string(),
            });
        }

        let request = TranscribeRequest {
            client: self.client.clone(),
            key: self.key.clone(),
            url: self.url.clone(),
            audio: audio.to_path_buf(),
            language: language.to_string(),
        };
        let task = tokio::spawn(async move {
            let event = match request.run(&events).await {
                Ok(()) => RecognitionEvent::SessionStopped,
                Err(details) => RecognitionEvent::Canceled(details),
            };
            // Receiver gone means the session already gave up.
            if events.send(event).is_err() {
                tracing::debug!("recognition session closed before completion");
            }
        });
        Ok(RecognitionHandle::from_task(task))
    }

    fn name(&self) -> &str {
        "azure"
    }
}

struct TranscribeRequest {
    client: reqwest::Client,
    key: String,
    url: String,
    audio: PathBuf,
    language: String,
}

impl TranscribeRequest {
    async fn run(self, events: &EventSender) -> std::result::Result<(), CancellationDetails> {
        let bytes = tokio::fs::read(&self.audio).await.map_err(|e| {
            CancellationDetails::new(
                "Error",
                "RuntimeError",
                format!("failed to read {}: {e}", self.audio.display()),
            )
        })?;
        let file_name = self
            .audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        tracing::info!(file = %file_name, bytes = bytes.len(), language = %self.language, "uploading audio");

        let definition = serde_json::json!({ "locales": [self.language] }).to_string();
        let form = Form::new()
            .part("audio", Part::bytes(bytes).file_name(file_name))
            .text("definition", definition);

        let response = self
            .client
            .post(&self.url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_cancellation)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_cancellation)?;
        if !status.is_success() {
            return Err(cancellation_for_status(status, &text));
        }

        for event in parse_phrases(&text)? {
            if events.send(event).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn transport_cancellation(e: reqwest::Error) -> CancellationDetails {
    let code = if e.is_timeout() {
        "ServiceTimeout"
    } else {
        "ConnectionFailure"
    };
    let details = if e.is_timeout() {
        format!("request timeout: {e}")
    } else {
        e.to_string()
    };
    CancellationDetails::new("Error", code, details)
}

/// Turn a transcription response body into recognition events.
fn parse_phrases(body: &str) -> std::result::Result<Vec<RecognitionEvent>, CancellationDetails> {
    let response: TranscriptionResponse = serde_json::from_str(body).map_err(|e| {
        CancellationDetails::new(
            "Error",
            "ServiceError",
            format!("unexpected transcription response: {e}"),
        )
    })?;

    Ok(response
        .phrases
        .into_iter()
        .map(|phrase| {
            if phrase.text.is_empty() {
                RecognitionEvent::NoMatch
            } else {
                RecognitionEvent::Recognized {
                    offset_ticks: phrase.offset_milliseconds * TICKS_PER_MILLISECOND,
                    duration_ticks: phrase.duration_milliseconds * TICKS_PER_MILLISECOND,
                    text: phrase.text,
                }
            }
        })
        .collect())
}
