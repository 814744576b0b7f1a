use crate::errors::CoinLedgerError;
use crate::utils::body_sample;
use async_trait::async_trait;
use log::trace;
#[cfg(any(test, feature = "test-util"))]
use mockall::automock;
use reqwest::Method;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: vec![],
            body: None,
        }
    }

    pub fn post_json(url: &str, body: String) -> HttpRequest {
        HttpRequest {
            method: Method::POST,
            url: url.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> HttpRequest {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: &str) -> HttpResponse {
        HttpResponse { status: 200, body: body.to_string() }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Fails with a bounded body sample unless the status is 200.
    pub fn expect_ok(self) -> Result<HttpResponse, CoinLedgerError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(CoinLedgerError::UnexpectedStatus {
                status: self.status,
                body: body_sample(&self.body),
            })
        }
    }
}

/// Executes one HTTP request. Everything that talks to the network goes through this.
#[cfg_attr(any(test, feature = "test-util"), automock)]
#[async_trait]
pub trait Doer: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CoinLedgerError>;
}

#[async_trait]
impl Doer for reqwest::Client {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CoinLedgerError> {
        let mut builder = self.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let res = builder.send().await?;
        trace!("Response: {:?} {}", res.version(), res.status());
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(HttpResponse { status, body })
    }
}

pub fn build_client(proxy: Option<&str>) -> Result<reqwest::Client, CoinLedgerError> {
    let builder = reqwest::Client::builder();
    let proxy_builder = match proxy {
        Some(val) => { builder.proxy(reqwest::Proxy::all(val)?) }
        None => { builder }
    };

    Ok(proxy_builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_ok_samples_body() {
        let response = HttpResponse { status: 502, body: "b".repeat(300) };
        match response.expect_ok() {
            Err(CoinLedgerError::UnexpectedStatus { status, body }) => {
                assert_eq!(502, status);
                assert_eq!(200, body.len());
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_post_json_sets_content_type() {
        let request = HttpRequest::post_json("http://node.localhost/rpc", "{}".to_string())
            .header("Authorization", "Bearer abc");
        assert_eq!(Method::POST, request.method);
        assert_eq!(2, request.headers.len());
        assert_eq!(("Content-Type".to_string(), "application/json".to_string()), request.headers[0]);
    }

    #[test]
    fn test_build_client_with_proxy() {
        assert!(build_client(Some("http://localhost:7890")).is_ok());
        assert!(build_client(None).is_ok());
    }
}
