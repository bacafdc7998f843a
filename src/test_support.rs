use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::clock::ManualClock;
use crate::error::Result;
use crate::gateway::{CompletionGateway, GenerationSettings};
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage};
use crate::rate_limit::{AdmissionController, MemoryWindowStore};
use crate::state::AppState;
use crate::upstream::{CompletionBackend, classify_failure};

enum Reply {
    Content(String, Option<Value>),
    Failure(u16, String),
}

// In-process backend that records what it was asked
pub struct StubBackend {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Option<ChatCompletionRequest>>,
}

impl StubBackend {
    pub fn replying(content: &str) -> Self {
        Self::new(Reply::Content(content.to_string(), None))
    }

    // non-2xx reply, classified the same way the HTTP client does
    pub fn failing(status: u16, body: &str) -> Self {
        Self::new(Reply::Failure(status, body.to_string()))
    }

    pub fn with_usage(mut self, usage: Value) -> Self {
        if let Reply::Content(_, ref mut slot) = self.reply {
            *slot = Some(usage);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last.lock().unwrap().clone()
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(
        &self,
        _credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        match &self.reply {
            Reply::Content(content, usage) => Ok(ChatCompletionResponse {
                choices: vec![Choice {
                    message: Some(ChoiceMessage {
                        content: Some(content.clone()),
                    }),
                }],
                usage: usage.clone(),
            }),
            Reply::Failure(status, body) => Err(classify_failure(*status, body)),
        }
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub backend: Arc<StubBackend>,
    pub clock: Arc<ManualClock>,
}

// 5 requests per 5 minutes, like the deployed defaults
pub fn test_app(backend: StubBackend, credential: Option<&str>) -> TestApp {
    let backend = Arc::new(backend);
    let clock = Arc::new(ManualClock::new());

    let state = Arc::new(AppState {
        admission: AdmissionController::new(
            Arc::new(MemoryWindowStore::default()),
            clock.clone(),
            5,
            Duration::from_secs(300),
        ),
        gateway: CompletionGateway::new(
            backend.clone(),
            credential.map(str::to_string),
            GenerationSettings::default(),
        ),
    });

    TestApp {
        state,
        backend,
        clock,
    }
}
