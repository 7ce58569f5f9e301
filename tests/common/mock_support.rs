#![allow(dead_code)]

//! Shared mock transport and notifier for the integration tests.

use api_relay::error::{ApiError, Result};
use api_relay::notify::{Notice, Notifier};
use api_relay::transport::{HttpTransport, WireRequest, WireResponse};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

enum Scripted {
    Response(u16, Value),
    TransportError(String),
}

/// Transport that replays a scripted sequence of responses and records every
/// request. When the script runs out, it answers 200 with an empty object.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<WireRequest>>,
    calls: AtomicU32,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(self: Arc<Self>, status: u16, body: Value) -> Arc<Self> {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(status, body));
        self
    }

    pub fn respond_times(self: Arc<Self>, count: usize, status: u16, body: Value) -> Arc<Self> {
        {
            let mut script = self.script.lock().unwrap();
            for _ in 0..count {
                script.push_back(Scripted::Response(status, body.clone()));
            }
        }
        self
    }

    pub fn fail(self: Arc<Self>, message: &str) -> Arc<Self> {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::TransportError(message.to_string()));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<WireRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(status, body)) => Ok(WireResponse {
                status,
                status_text: status_text(status).to_string(),
                body,
            }),
            Some(Scripted::TransportError(message)) => Err(ApiError::Transport(message)),
            None => Ok(WireResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: json!({}),
            }),
        }
    }
}

/// Notifier that records every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|notice| notice.title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
