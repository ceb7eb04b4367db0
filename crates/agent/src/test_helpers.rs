//! Shared test helpers for agent tests.

use async_trait::async_trait;
use autochat_core::error::{ProviderError, ToolError};
use autochat_core::message::Message;
use autochat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use autochat_core::tool::{Tool, ToolResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` pops the next reply and records the request.
/// Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    repeat_last: Option<String>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<String>) -> Self {
        Self::scripted(replies.into_iter().map(Ok).collect())
    }

    pub fn scripted(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            repeat_last: None,
        }
    }

    /// Answers every call with `reply`, forever.
    pub fn always(reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            repeat_last: Some(reply.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let reply = match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => match &self.repeat_last {
                Some(text) => Ok(text.clone()),
                None => panic!("SequentialMockProvider: no more replies (call #{call})"),
            },
        };
        reply.map(|text| make_text_response(&text))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// JSON for one agent step.
pub fn step(thought: &str, action: serde_json::Value) -> String {
    serde_json::json!({ "thought": thought, "action": action }).to_string()
}

/// JSON for a `give_final_answer` step.
pub fn final_answer(answer: &str) -> String {
    step(
        "The objective is complete.",
        serde_json::json!({ "type": "give_final_answer", "answer": answer }),
    )
}

/// A tool that counts its invocations and echoes its arguments.
pub struct CountingTool {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingTool {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// A tool whose every call fails.
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    /// Handle to the invocation count, still readable after the tool is boxed.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Counts invocations"
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name.into(),
                reason: "backend said no".into(),
            });
        }
        Ok(ToolResult::ok(format!("{} ran with {arguments}", self.name)))
    }
}
