//! A scripted [`Http`] implementation for tests.
//!
//! Returns pre-defined replies in order and records every request, so
//! tests can assert both outcomes and call counts without a network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result as HttpResult;
use async_trait::async_trait;
use serde_json::Value;

use super::{Http, HttpRequest, HttpResponse};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this status and JSON body.
    Response { status: u16, body: Value },
    /// Fail at the transport level with this message.
    Error(String),
    /// Never resolve (exercises the timeout race).
    Hang,
}

impl Reply {
    pub fn status(status: u16, body: Value) -> Self {
        Reply::Response { status, body }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    pub fn hang() -> Self {
        Reply::Hang
    }
}

/// Scripted HTTP double. Replies are consumed in order; running past
/// the script is a test bug and fails loudly.
pub struct MockHttp {
    replies: Vec<Reply>,
    cursor: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
    call_times: Mutex<Vec<std::time::Instant>>,
}

impl MockHttp {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            cursor: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    /// How many requests have been issued so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every request seen, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// When each request arrived. Lets tests assert on backoff gaps.
    pub fn call_times(&self) -> Vec<std::time::Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Http for MockHttp {
    async fn execute(&self, request: &HttpRequest) -> HttpResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.call_times.lock().unwrap().push(std::time::Instant::now());
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .get(i)
            .ok_or_else(|| anyhow::anyhow!("MockHttp: no more replies (call {})", i + 1))?;

        match reply {
            Reply::Response { status, body } => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            Reply::Error(message) => Err(anyhow::anyhow!("{}", message)),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Adapter so tests can keep an [`std::sync::Arc`] handle on the mock
/// for assertions while the transport owns the boxed trait object.
pub struct SharedHttp(pub std::sync::Arc<MockHttp>);

#[async_trait]
impl Http for SharedHttp {
    async fn execute(&self, request: &HttpRequest) -> HttpResult<HttpResponse> {
        self.0.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_consumed_in_order() {
        let mock = MockHttp::new(vec![
            Reply::status(200, json!({"n": 1})),
            Reply::status(500, json!({"n": 2})),
        ]);

        let first = mock.execute(&HttpRequest::get("http://t/a")).await.unwrap();
        assert_eq!(first.status, 200);
        let second = mock.execute(&HttpRequest::get("http://t/b")).await.unwrap();
        assert_eq!(second.status, 500);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let mock = MockHttp::new(vec![]);
        let result = mock.execute(&HttpRequest::get("http://t/a")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let mock = MockHttp::new(vec![Reply::status(200, json!({}))]);
        mock.execute(&HttpRequest::post("http://t/jobs", json!({"x": 1})))
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://t/jobs");
        assert_eq!(requests[0].method, super::super::Method::Post);
    }
}
