use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            json: None,
        }
    }

    pub fn post(url: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            json: Some(json),
        }
    }

    pub fn delete(url: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            method: Method::Delete,
            url: url.into(),
            headers: Vec::new(),
            json: Some(json),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }

    pub fn into_error(self, url: &str) -> Error {
        Error::Transport {
            url: url.to_string(),
            status: Some(self.status),
            body: self.body,
        }
    }
}

/// HTTP access used by the pipeline. Calls are awaited one at a time.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Returns the response for any status code; only network failures are errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            json,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(json) = &json {
            builder = builder.json(json);
        }

        let network_error = |e: reqwest::Error| Error::Transport {
            url: url.clone(),
            status: None,
            body: e.to_string(),
        };

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());
        let redirect = HttpResponse {
            status: 302,
            body: String::new(),
        };
        assert!(!redirect.is_success());
    }

    #[test]
    fn test_into_error_keeps_body() {
        let response = HttpResponse {
            status: 401,
            body: "{\"message\":\"invalid\"}".to_string(),
        };
        match response.into_error("https://example.com/login") {
            Error::Transport { url, status, body } => {
                assert_eq!(url, "https://example.com/login");
                assert_eq!(status, Some(401));
                assert_eq!(body, "{\"message\":\"invalid\"}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_error() {
        let response = HttpResponse {
            status: 200,
            body: "not json".to_string(),
        };
        let result: Result<serde_json::Value> = response.json("https://example.com");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
