//! Scripted adapter for exercising the client without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use super::{BoxFuture, HttpAdapter, HttpRequest, HttpResponse, ResponseBody};
use crate::error::{ChronofyError, ChronofyResult};

/// One recorded call: the base URL and the request as the adapter saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub base_url: String,
    pub request: HttpRequest,
}

/// Replays queued outcomes in order and records every call.
///
/// Sending with an empty queue fails with an adapter error so a test that
/// makes an unexpected extra call fails loudly instead of hanging.
#[derive(Debug, Default)]
pub(crate) struct MockAdapter {
    script: Mutex<VecDeque<ChronofyResult<(u16, ResponseBody)>>>,
    calls: Mutex<Vec<RecordedCall>>,
    last: Mutex<Option<HttpResponse>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful JSON response.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(Ok((status, ResponseBody::Json(body))))
    }

    /// Queues a failure.
    pub fn push_error(&self, error: ChronofyError) -> &Self {
        self.push(Err(error))
    }

    pub fn push(&self, outcome: ChronofyResult<(u16, ResponseBody)>) -> &Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl HttpAdapter for MockAdapter {
    fn send<'a>(
        &'a self,
        base_url: &'a str,
        request: HttpRequest,
    ) -> BoxFuture<'a, ChronofyResult<ResponseBody>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RecordedCall {
                base_url: base_url.to_string(),
                request,
            });
            *self.last.lock().unwrap() = None;

            let outcome = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChronofyError::adapter("mock adapter script exhausted")));

            let (status, body) = outcome?;
            *self.last.lock().unwrap() = Some(HttpResponse {
                status,
                headers: Vec::new(),
                content: body.clone().into_text(),
            });
            Ok(body)
        })
    }

    fn last_response(&self) -> Option<HttpResponse> {
        self.last.lock().unwrap().clone()
    }
}
