use serde_json::{Value, json};
use tracing::{error, info};

use crate::{
    error::{ReelnoteError, Result},
    provider::Provider,
    types::Comment,
};

static TRANSCRIPT_SUMMARY_PROMPT: &str = "You are given the transcript of a video, with timestamps. \
Write a summary followed by its key points. Leave the timestamps out and add no extra text or explanation. \
Mark key points as lines starting with `*` and emphasise important terms with **double asterisks**.";

static COMMENT_DIGEST_PROMPT: &str = "You help summarise viewer comments on a video. \
The first message lists the comments with the passage each one refers to; the second is the video summary. \
Write a short summary of what the comments say in light of the video. Do not add any extra lines of content.";

/// Text-in/text-out client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl Summarizer {
    /// Client for one of the built-in providers. Fails if its API key is unset.
    pub fn new(provider: &Provider) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        Ok(Self::with_endpoint(config.api_url, config.model, api_key))
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn summarize_transcript(&self, transcript: &str) -> Result<String> {
        if transcript.trim().is_empty() {
            return Err(ReelnoteError::SummaryFailed {
                reason: "transcript is empty".into(),
            });
        }

        info!(model = %self.model, chars = transcript.len(), "summarizing transcript");
        self.complete(vec![
            json!({ "role": "system", "content": TRANSCRIPT_SUMMARY_PROMPT }),
            json!({ "role": "user", "content": transcript }),
        ])
        .await
    }

    /// Summarize what the comments say, using the video summary as context.
    pub async fn digest_comments(&self, comments: &[Comment], summary: &str) -> Result<String> {
        if comments.is_empty() {
            return Err(ReelnoteError::SummaryFailed {
                reason: "there are no comments to summarize".into(),
            });
        }

        let items = comments
            .iter()
            .map(|c| format!("- on \"{}\": {}", c.ref_text.text, c.text))
            .collect::<Vec<_>>()
            .join("\n");

        info!(model = %self.model, comments = comments.len(), "summarizing comments");
        self.complete(vec![
            json!({ "role": "system", "content": COMMENT_DIGEST_PROMPT }),
            json!({ "role": "user", "content": items }),
            json!({ "role": "user", "content": summary }),
        ])
        .await
    }

    async fn complete(&self, messages: Vec<Value>) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": messages,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "summarization endpoint rejected the request");
            return Err(ReelnoteError::SummaryFailed {
                reason: format!("endpoint returned {status}"),
            });
        }

        let response = response.json::<Value>().await?;
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ReelnoteError::SummaryFailed {
                reason: format!("Invalid API response: {response}"),
            })?;

        Ok(content.trim().to_string())
    }
}
