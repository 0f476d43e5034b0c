//! Model backends served over HTTP.
//!
//! Requests follow the Hugging Face inference API: a JSON body with `inputs`
//! and `parameters`, optional bearer token. Calls are blocking and must run
//! on a blocking worker, never on the async executor.

use std::time::Duration;

use legalease_core::{Error, Result, SummaryLength};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::qa::{char_to_byte, QaPrediction, QuestionAnswerer};
use crate::summarizer::Summarizer;

/// A JSON-over-HTTP model endpoint.
struct Endpoint {
    client: reqwest::blocking::Client,
    url: String,
    token: Option<String>,
}

impl Endpoint {
    fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
            token,
        })
    }

    /// POST `body` and return the raw response text of a successful call.
    fn post(&self, body: &serde_json::Value) -> Result<String> {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| Error::Inference(format!("{} unreachable: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Inference(format!(
                "{} returned {}: {}",
                self.url, status, detail
            )));
        }

        response
            .text()
            .map_err(|e| Error::Inference(format!("Unreadable response from {}: {}", self.url, e)))
    }
}

/// Pipelines answer with a list for batched inputs and a bare object
/// otherwise; both shapes are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

/// Decode the first result of a pipeline response.
fn first_result<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let parsed: OneOrMany<T> = serde_json::from_str(body)?;
    Ok(parsed.first())
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary_text: String,
}

fn parse_summary(body: &str) -> Result<String> {
    first_result::<SummaryResponse>(body)?
        .map(|r| r.summary_text)
        .ok_or_else(|| Error::Inference("summarization returned no results".into()))
}

/// Summarizer backed by a remote summarization pipeline.
pub struct HttpSummarizer {
    endpoint: Endpoint,
}

impl HttpSummarizer {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(url, token, timeout)?,
        })
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": {
                "min_length": length.min,
                "max_length": length.max,
                "do_sample": false,
            },
        });
        let summary = parse_summary(&self.endpoint.post(&body)?)?;
        debug!("Summarized {} chars into {} chars", text.len(), summary.len());
        Ok(summary)
    }
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    answer: String,
    score: f32,
    /// Character offsets into the context.
    start: usize,
    end: usize,
}

/// Decode a QA response, turning its character offsets into byte offsets
/// of `context`.
fn parse_answer(body: &str, context: &str) -> Result<QaPrediction> {
    let response: AnswerResponse = first_result(body)?
        .ok_or_else(|| Error::Inference("question answering returned no results".into()))?;
    Ok(QaPrediction {
        span: char_to_byte(context, response.start)..char_to_byte(context, response.end),
        answer: response.answer,
        score: response.score,
    })
}

/// Extractive QA backed by a remote question-answering pipeline.
pub struct HttpQuestionAnswerer {
    endpoint: Endpoint,
}

impl HttpQuestionAnswerer {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(url, token, timeout)?,
        })
    }
}

impl QuestionAnswerer for HttpQuestionAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<QaPrediction> {
        let body = serde_json::json!({
            "inputs": {
                "question": question,
                "context": context,
            },
        });
        parse_answer(&self.endpoint.post(&body)?, context)
    }
}
