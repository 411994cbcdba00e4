//! Real [`Http`] implementation on reqwest.

use anyhow::{Context, Result as HttpResult};
use async_trait::async_trait;
use serde_json::Value;

use super::{Http, HttpRequest, HttpResponse, Method};

/// Production HTTP layer. One shared reqwest client; per-call timeouts
/// are enforced by the transport's race, not here.
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Http for ReqwestHttp {
    async fn execute(&self, request: &HttpRequest) -> HttpResult<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        builder = builder.header("accept", "application/json");
        if let Some(body) = &request.body {
            builder = builder.header("content-type", "application/json").json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("request to {} failed", request.url))?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        // Non-JSON bodies (proxy error pages etc.) are kept as a string
        // value so callers still see them in messages.
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        Ok(HttpResponse { status, body })
    }
}
