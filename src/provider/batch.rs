//! Batch request types
//!
//! A batch is a list of [`BatchRequest`]s submitted at once through a
//! provider's [`BatchSubmitter`]. Submissions are remembered as
//! [`BatchRecord`]s, whose JSON shape is the one stored in the batch history.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::provider::{ChatMessage, GenerationParams};

pub const DEFAULT_BATCH_URL: &str = "/v1/chat/completions";

/// Body keys that identify the call rather than tune it.
const ROUTING_KEYS: [&str; 2] = ["model", "messages"];

/// One request of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: Map<String, Value>,
    /// The user-visible prompt, kept for the history view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
}

impl BatchRequest {
    pub fn new(
        custom_id: impl Into<String>,
        body: Value,
        prompt_text: Option<String>,
    ) -> Result<Self, ProviderError> {
        let custom_id = custom_id.into();
        if custom_id.trim().is_empty() {
            return Err(ProviderError::InvalidBatchRequest(
                "custom_id must not be empty".to_string(),
            ));
        }
        let body = match body {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(ProviderError::InvalidBatchRequest(format!(
                    "request {custom_id} needs a non-empty JSON object body"
                )));
            }
        };

        Ok(Self {
            custom_id,
            method: "POST".to_string(),
            url: DEFAULT_BATCH_URL.to_string(),
            body,
            prompt_text,
        })
    }

    /// A single-turn chat request for `model`.
    pub fn chat(
        custom_id: impl Into<String>,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Self, ProviderError> {
        let mut body = Map::new();
        body.insert("model".to_string(), Value::from(model));
        body.insert(
            "messages".to_string(),
            serde_json::to_value([ChatMessage::user(prompt)])
                .map_err(|e| ProviderError::InvalidBatchRequest(e.to_string()))?,
        );
        body.extend(params.to_json_map());
        Self::new(custom_id, Value::Object(body), Some(prompt.to_string()))
    }

    pub fn with_method(mut self, method: &str) -> Result<Self, ProviderError> {
        let method = method.to_ascii_uppercase();
        if method != "POST" && method != "GET" {
            return Err(ProviderError::InvalidBatchRequest(format!(
                "unsupported method {method}, expected POST or GET"
            )));
        }
        self.method = method;
        Ok(self)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.body.get("model").and_then(Value::as_str)
    }

    /// The tuning parameters of the body: everything except model and messages.
    pub fn model_params(&self) -> Map<String, Value> {
        self.body
            .iter()
            .filter(|(key, _)| !ROUTING_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// A request after provider-specific parameter preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedRequest {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Succeeded,
    Failed,
}

/// Outcome of one request of a finished batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub custom_id: String,
    pub status: ResultStatus,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    /// Extracted answer text.
    #[serde(default)]
    pub clean_response: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub raw_data: Value,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub custom_id: String,
    #[serde(default)]
    pub prompt_text: Option<String>,
}

/// A submitted batch, as kept in the batch history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub provider: String,
    pub status: String,
    pub submitted_at: String,
    #[serde(default)]
    pub requests: Vec<RecordedRequest>,
}

impl BatchRecord {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        submitted_at: impl Into<String>,
        requests: &[BatchRequest],
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            status: "submitted".to_string(),
            submitted_at: submitted_at.into(),
            requests: requests
                .iter()
                .map(|request| RecordedRequest {
                    custom_id: request.custom_id.clone(),
                    prompt_text: request.prompt_text.clone(),
                })
                .collect(),
        }
    }

    /// Add this record at the front of `history`, replacing an entry with the same id.
    pub fn record_in(self, history: &mut Vec<BatchRecord>) {
        history.retain(|entry| entry.id != self.id);
        history.insert(0, self);
    }

    pub fn prompt_for(&self, custom_id: &str) -> Option<&str> {
        self.requests
            .iter()
            .find(|request| request.custom_id == custom_id)
            .and_then(|request| request.prompt_text.as_deref())
    }
}

/// Provider side of batch processing.
pub trait BatchSubmitter {
    fn provider_name(&self) -> &str;

    /// Submit prepared requests and return the provider's batch id.
    fn submit(
        &self,
        requests: Vec<PreparedRequest>,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<String, ProviderError>;

    fn status(&self, batch_id: &str) -> Result<String, ProviderError>;

    fn results(&self, batch_id: &str) -> Result<Vec<BatchResult>, ProviderError>;
}

/// Submit `requests` after running their tuning parameters through `prepare`.
///
/// Model and messages are kept as they are; `prepare` receives the remaining
/// body keys and returns the provider's version of them.
pub fn submit_prepared<P>(
    submitter: &dyn BatchSubmitter,
    requests: &[BatchRequest],
    metadata: Option<&Map<String, Value>>,
    prepare: P,
) -> Result<String, ProviderError>
where
    P: Fn(Map<String, Value>) -> Map<String, Value>,
{
    if requests.is_empty() {
        return Err(ProviderError::InvalidBatchRequest(
            "a batch needs at least one request".to_string(),
        ));
    }

    let prepared: Vec<PreparedRequest> = requests
        .iter()
        .map(|request| {
            let mut body: Map<String, Value> = ROUTING_KEYS
                .iter()
                .filter_map(|key| request.body.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect();
            body.extend(prepare(request.model_params()));

            PreparedRequest {
                custom_id: request.custom_id.clone(),
                method: request.method.clone(),
                url: request.url.clone(),
                body,
            }
        })
        .collect();

    log::info!(
        "Submitting {} requests to {}",
        prepared.len(),
        submitter.provider_name()
    );
    submitter.submit(prepared, metadata)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: RefCell<Vec<PreparedRequest>>,
    }

    impl BatchSubmitter for RecordingSubmitter {
        fn provider_name(&self) -> &str {
            "recording"
        }

        fn submit(
            &self,
            requests: Vec<PreparedRequest>,
            _metadata: Option<&Map<String, Value>>,
        ) -> Result<String, ProviderError> {
            self.submitted.borrow_mut().extend(requests);
            Ok("batch_1".to_string())
        }

        fn status(&self, _batch_id: &str) -> Result<String, ProviderError> {
            Ok("completed".to_string())
        }

        fn results(&self, _batch_id: &str) -> Result<Vec<BatchResult>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(BatchRequest::new(" ", json!({"model": "m"}), None).is_err());
        assert!(BatchRequest::new("r1", json!({}), None).is_err());
        assert!(BatchRequest::new("r1", json!("text"), None).is_err());

        let request = BatchRequest::new("r1", json!({"model": "m"}), None).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, DEFAULT_BATCH_URL);
        assert!(request.clone().with_method("get").is_ok());
        assert!(request.with_method("DELETE").is_err());
    }

    #[test]
    fn test_chat_request_body() {
        let request =
            BatchRequest::chat("r1", "gpt-4o", "Hello", &GenerationParams::default()).unwrap();
        assert_eq!(request.model(), Some("gpt-4o"));
        assert_eq!(request.body["messages"][0]["role"], "user");
        assert_eq!(request.prompt_text.as_deref(), Some("Hello"));

        let params = request.model_params();
        assert!(params.contains_key("max_tokens"));
        assert!(!params.contains_key("model"));
    }

    #[test]
    fn test_submit_prepared_applies_preparation() {
        let submitter = RecordingSubmitter::default();
        let request =
            BatchRequest::chat("r1", "gpt-4o", "Hello", &GenerationParams::default()).unwrap();

        let id = submit_prepared(&submitter, &[request], None, |mut params| {
            params.remove("top_k");
            if let Some(max) = params.remove("max_tokens") {
                params.insert("max_completion_tokens".to_string(), max);
            }
            params
        })
        .unwrap();

        assert_eq!(id, "batch_1");
        let submitted = submitter.submitted.borrow();
        let body = &submitted[0].body;
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_completion_tokens"], 1000);
        assert!(!body.contains_key("top_k"));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let submitter = RecordingSubmitter::default();
        assert!(submit_prepared(&submitter, &[], None, |p| p).is_err());
    }

    #[test]
    fn test_record_history_shape() {
        let request = BatchRequest::new("r1", json!({"model": "m"}), Some("Hi".into())).unwrap();
        let record = BatchRecord::new("batch_1", "openai", "2024-05-01T10:00:00", &[request]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "batch_1",
                "provider": "openai",
                "status": "submitted",
                "submitted_at": "2024-05-01T10:00:00",
                "requests": [{"custom_id": "r1", "prompt_text": "Hi"}]
            })
        );
        assert_eq!(record.prompt_for("r1"), Some("Hi"));

        let mut history = vec![record.clone()];
        BatchRecord {
            status: "completed".to_string(),
            ..record
        }
        .record_in(&mut history);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, "completed");
    }
}
