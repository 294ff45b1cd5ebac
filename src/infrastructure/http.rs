use crate::config::GatewayConfig;
use crate::domain::gateway::{ApiResponse, CheckoutData, InitiatePaymentBody, StatusData};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::PaymentGateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const INITIATE_PAYMENT_PATH: &str = "/daraja/initiate-payment";
pub const PAYMENT_STATUS_PATH: &str = "/daraja/payment-status";

/// Payment backend reached over HTTP/JSON.
///
/// The underlying `reqwest::Client` is cheap to clone and pools connections,
/// so one `HttpGateway` is meant to be shared for the lifetime of the
/// process.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = self
            .authorize(request)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_response(status, &body)
    }
}

/// Turns a raw HTTP answer into an envelope. Non-2xx answers are errors,
/// carrying the backend's `message` when it sent one.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<ApiResponse<T>> {
    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        return Err(PaymentError::Gateway(message));
    }

    Ok(serde_json::from_slice(body)?)
}

/// Status endpoint for one checkout. The id is pushed as a single escaped
/// path segment, so `/`, `?` or `#` in it cannot address another resource.
fn status_url(config: &GatewayConfig, checkout_request_id: &str) -> Result<Url> {
    let mut url = Url::parse(&config.endpoint(PAYMENT_STATUS_PATH))
        .map_err(|e| PaymentError::Config(format!("invalid API URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| PaymentError::Config("API URL cannot carry a path".into()))?
        .push(checkout_request_id);
    Ok(url)
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<ApiResponse<CheckoutData>> {
        let url = self.config.endpoint(INITIATE_PAYMENT_PATH);
        tracing::debug!(%url, amount = %request.amount, "initiating payment");
        let body = InitiatePaymentBody::from(request);
        self.send(self.client.post(url).json(&body)).await
    }

    async fn payment_status(&self, checkout_request_id: &str) -> Result<ApiResponse<StatusData>> {
        let url = status_url(&self.config, checkout_request_id)?;
        tracing::debug!(%url, "querying payment status");
        self.send(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentForm;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response and hands back the raw request.
    async fn serve_once(
        status_line: &str,
        body: &str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/api/v1", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    #[test]
    fn test_decode_non_success_uses_backend_message() {
        let result = decode_response::<StatusData>(
            StatusCode::BAD_REQUEST,
            br#"{"success":false,"message":"Invalid phone number"}"#,
        );
        assert!(matches!(result, Err(PaymentError::Gateway(ref m)) if m == "Invalid phone number"));

        let result = decode_response::<StatusData>(StatusCode::BAD_GATEWAY, b"<html>");
        assert!(matches!(
            result,
            Err(PaymentError::Gateway(ref m)) if m == "HTTP error! status: 502"
        ));
    }

    #[test]
    fn test_status_url_escapes_checkout_id() {
        let config = GatewayConfig::new("http://localhost:5000/api/v1/");
        assert_eq!(
            status_url(&config, "ws_CO_42").unwrap().as_str(),
            "http://localhost:5000/api/v1/daraja/payment-status/ws_CO_42"
        );
        assert_eq!(
            status_url(&config, "../x?y#z").unwrap().as_str(),
            "http://localhost:5000/api/v1/daraja/payment-status/..%2Fx%3Fy%23z"
        );
    }

    #[test]
    fn test_decode_malformed_body() {
        let result = decode_response::<StatusData>(StatusCode::OK, b"not json");
        assert!(matches!(result, Err(PaymentError::Json(_))));
    }

    #[tokio::test]
    async fn test_initiate_payment_over_http() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"checkoutRequestID":"ws_CO_42"}}"#,
        )
        .await;
        let config = GatewayConfig::new(base_url).with_auth_token("secret");
        let gateway = HttpGateway::new(config).unwrap();
        let request = PaymentForm::new("500", "0712345678").validate().unwrap();

        let response = gateway.initiate_payment(&request).await.unwrap();
        assert!(response.success);
        assert_eq!(
            response.data.unwrap().checkout_request_id.as_deref(),
            Some("ws_CO_42")
        );

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/v1/daraja/initiate-payment "));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(raw.contains(r#""phoneNumber":"0712345678""#));
    }

    #[tokio::test]
    async fn test_payment_status_over_http() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"status":"completed","mpesaReceiptNumber":"QK12"}}"#,
        )
        .await;
        let gateway = HttpGateway::new(GatewayConfig::new(base_url)).unwrap();

        let response = gateway.payment_status("ws_CO_42").await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.status, "completed");
        assert_eq!(data.extra["mpesaReceiptNumber"], "QK12");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/v1/daraja/payment-status/ws_CO_42 "));
        assert!(!raw.to_ascii_lowercase().contains("authorization:"));
    }
}
