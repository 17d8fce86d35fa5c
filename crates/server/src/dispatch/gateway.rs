//! Outbound messaging gateway.
//!
//! The pipeline only needs `(destination, body) -> provider message id`;
//! which vendor sits behind the HTTP endpoint is configuration. Every
//! send carries its own timeout so one unresponsive gateway endpoint
//! cannot stall the rest of a fan-out.

use crate::config::SmsConfig;
use crate::error::GatewayError;
use crate::validation::phone::is_canonical_phone;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio::time::timeout;

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Deliver `body` to the canonical number `to`, returning the
    /// provider's message id.
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, GatewayError>;
}

/// JSON-over-HTTPS gateway client.
pub struct HttpSmsGateway {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: SmsConfig,
}

impl HttpSmsGateway {
    pub fn new(config: SmsConfig) -> std::io::Result<Self> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_only()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    #[tracing::instrument(skip(self, body))]
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, GatewayError> {
        if !is_canonical_phone(to) {
            return Err(GatewayError::InvalidDestination(to.to_string()));
        }

        let payload = serde_json::json!({
            "account_sid": self.config.account_sid,
            "from": self.config.from_number,
            "to": to,
            "body": body,
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri(&self.config.api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.config.auth_token),
            )
            .body(Full::new(Bytes::from(payload.to_string())))
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let send_timeout = self.config.send_timeout();
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?;
            let status = response.status();
            let bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?
                .to_bytes();
            Ok::<(StatusCode, Bytes), GatewayError>((status, bytes))
        };

        let (status, bytes) = timeout(send_timeout, exchange)
            .await
            .map_err(|_| GatewayError::Timeout(send_timeout))??;

        if !status.is_success() {
            let detail = String::from_utf8_lossy(&bytes);
            return Err(GatewayError::Rejected(format!(
                "HTTP {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::Rejected(format!("unparseable gateway response: {e}")))?;
        value
            .get("message_id")
            .or_else(|| value.get("sid"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::Rejected("gateway response missing message id".to_string())
            })
    }
}
