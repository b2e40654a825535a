//! Shared helpers for integration tests: scripted model clients, fixtures
//! and a number-tolerant JSON comparison.

#![allow(dead_code)]

use async_trait::async_trait;
use mealscan::{
    AnalysisError, AnalysisRecord, AnalysisStore, Analyzer, AnalyzerConfig, ClientError, Completion,
    ImageTransport, ModelClient, ModelRequest, PersistenceError,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const DISH: &str = include_str!("../fixtures/dish.json");
pub const FRIDGE: &str = include_str!("../fixtures/fridge.json");
pub const RECIPE: &str = include_str!("../fixtures/recipe.json");

pub const DISH_URL: &str = "https://abc.supabase.co/storage/v1/object/public/images/lunch.jpg";
pub const SHELF_1: &str = "https://abc.supabase.co/storage/v1/object/public/images/shelf1.jpg";
pub const SHELF_2: &str = "https://abc.supabase.co/storage/v1/object/public/images/shelf2.jpg";

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// A [`ModelClient`] that answers from a script and records every request.
pub struct ScriptedClient {
    model: String,
    transport: ImageTransport,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    pub fn new(model: &str, replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Self::with_transport(model, ImageTransport::HostedUrl, replies)
    }

    pub fn with_transport(
        model: &str,
        transport: ImageTransport,
        replies: impl IntoIterator<Item = Reply>,
    ) -> Arc<Self> {
        Arc::new(Self {
            model: model.to_string(),
            transport,
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn image_transport(&self) -> ImageTransport {
        self.transport
    }

    async fn complete(&self, request: ModelRequest) -> Result<Completion, ClientError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(Completion {
                text,
                input_tokens: 100,
                output_tokens: 50,
            }),
            Some(Reply::Fail(message)) => Err(ClientError(message)),
            None => Err(ClientError("script exhausted".into())),
        }
    }
}

/// A store that always refuses the write.
pub struct FailingStore;

#[async_trait]
impl AnalysisStore for FailingStore {
    async fn save(&self, _record: &AnalysisRecord) -> Result<(), PersistenceError> {
        Err(PersistenceError::WriteFailed {
            detail: "database unavailable".into(),
        })
    }
}

/// A store that keeps every record in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<AnalysisRecord>>,
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub fn test_config() -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

/// An analyzer over two scripted clients with the default test config.
pub fn analyzer(
    vision: &Arc<ScriptedClient>,
    structuring: &Arc<ScriptedClient>,
) -> Analyzer {
    analyzer_with(vision, structuring, test_config())
}

pub fn analyzer_with(
    vision: &Arc<ScriptedClient>,
    structuring: &Arc<ScriptedClient>,
    config: AnalyzerConfig,
) -> Analyzer {
    Analyzer::new(vision.clone(), structuring.clone(), config)
}

/// Parse `text`, apply `edit`, and serialise it back.
pub fn edited(text: &str, edit: impl FnOnce(&mut Value)) -> String {
    let mut value: Value = serde_json::from_str(text).unwrap();
    edit(&mut value);
    value.to_string()
}

/// Structural JSON equality where `450` and `450.0` are the same number.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

pub fn expect_err<T: std::fmt::Debug>(result: Result<T, AnalysisError>) -> AnalysisError {
    match result {
        Ok(v) => panic!("expected an error, got {v:?}"),
        Err(e) => e,
    }
}
