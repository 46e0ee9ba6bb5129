//! Abstractive summarization client.
//!
//! Talks to a summarization inference endpoint (a t5-small-style model
//! served over HTTP). Decoding is deterministic: `do_sample` is pinned
//! off, output length is bounded to `[min_length, max_length]`. Any
//! transport or model failure, and any empty model output, surfaces as a
//! summarize error for the pipeline to log and skip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sheetsum_core::Summarizer;
use sheetsum_shared::{Result, SheetsumError, SummarizerConfig};

/// Upper bound on input characters sent to the model; page text beyond
/// this is cut off rather than rejected.
const MAX_INPUT_CHARS: usize = 12_000;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for the inference endpoint.
#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    model: &'a str,
    parameters: DecodeParameters,
}

/// Decoding parameters; `do_sample: false` keeps output deterministic.
#[derive(Debug, Serialize)]
struct DecodeParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

/// One candidate summary in the endpoint's response array.
#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP-backed [`Summarizer`] implementation.
pub struct InferenceSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    max_length: u32,
    min_length: u32,
}

impl InferenceSummarizer {
    /// Build a summarizer from the `[summarizer]` config section.
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SheetsumError::Summarize(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_length: config.max_length,
            min_length: config.min_length,
        })
    }
}

#[async_trait]
impl Summarizer for InferenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let input = truncate_input(text, MAX_INPUT_CHARS);
        debug!(
            chars = input.len(),
            model = %self.model,
            "requesting summary"
        );

        let request = SummarizeRequest {
            inputs: input,
            model: &self.model,
            parameters: DecodeParameters {
                max_length: self.max_length,
                min_length: self.min_length,
                do_sample: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SheetsumError::Summarize(format!("inference request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Summarize(format!(
                "inference endpoint returned HTTP {status}"
            )));
        }

        let outputs: Vec<SummaryOutput> = response
            .json()
            .await
            .map_err(|e| SheetsumError::Summarize(format!("invalid inference response: {e}")))?;

        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .unwrap_or_default();

        if summary.is_empty() {
            return Err(SheetsumError::Summarize("model returned no summary".into()));
        }

        Ok(summary)
    }
}

/// Cut `text` to at most `max_chars` bytes on a char boundary.
fn truncate_input(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
