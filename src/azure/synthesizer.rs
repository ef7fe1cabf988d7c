//! Synthesis through the text-to-speech REST endpoint.

use super::{build_client, cancellation_for_status, synthesis_url};
use crate::config::Credentials;
use crate::error::Result;
use crate::remote::CancellationDetails;
use crate::tts::synthesizer::{SpeechSynthesizer, SynthesisOutcome};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub struct AzureSynthesizer {
    client: reqwest::Client,
    key: String,
    url: String,
    output_format: String,
}

impl AzureSynthesizer {
    /// `output_format` is sent as `X-Microsoft-OutputFormat`; it must be a
    /// RIFF format for the parts to concatenate.
    pub fn new(
        credentials: &Credentials,
        output_format: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(request_timeout)?,
            key: credentials.key.clone(),
            url: synthesis_url(&credentials.target),
            output_format: output_format.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSynthesizer {
    async fn speak_ssml_to_file(&self, ssml: &str, output: &Path) -> Result<SynthesisOutcome> {
        let response = self
            .client
            .post(&self.url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .body(ssml.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(SynthesisOutcome::Canceled(cancellation_for_status(
                status, &body,
            )));
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(output).await?;
        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;

        if bytes == 0 {
            return Ok(SynthesisOutcome::Canceled(CancellationDetails::new(
                "Error",
                "ServiceError",
                "service returned an empty audio stream",
            )));
        }

        tracing::debug!(output = %output.display(), bytes, "audio written");
        Ok(SynthesisOutcome::Completed { bytes })
    }

    fn name(&self) -> &str {
        "azure"
    }
}
