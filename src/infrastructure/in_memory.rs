use crate::domain::gateway::{ApiResponse, CheckoutData, StatusData};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::PaymentGateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How the scripted backend answers an initiation.
#[derive(Debug, Clone)]
pub enum InitiateReply {
    Accept(CheckoutData),
    Reject(String),
    /// The call fails before an envelope is received.
    Error(String),
}

/// How the scripted backend answers one status query.
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(StatusData),
    Reject(String),
    Error(String),
}

impl StatusReply {
    pub fn pending() -> Self {
        Self::Status(StatusData::new("pending"))
    }

    pub fn completed() -> Self {
        Self::Status(StatusData::new("completed"))
    }

    pub fn failed() -> Self {
        Self::Status(StatusData::new("failed"))
    }
}

#[derive(Debug)]
struct Script {
    initiate: InitiateReply,
    statuses: VecDeque<StatusReply>,
    fallback: StatusReply,
    latency: Duration,
    requests: Vec<PaymentRequest>,
    status_queries: Vec<String>,
}

/// An in-memory payment backend that replays scripted answers.
///
/// Status replies are consumed in order; once the queue is empty the
/// fallback reply (pending by default) is returned forever. Every call is
/// recorded so tests can assert on exactly what was sent.
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    script: Arc<RwLock<Script>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    /// Creates a gateway that accepts every payment and reports it pending.
    pub fn new() -> Self {
        Self {
            script: Arc::new(RwLock::new(Script {
                initiate: InitiateReply::Accept(CheckoutData::new("ws_CO_SIMULATED")),
                statuses: VecDeque::new(),
                fallback: StatusReply::pending(),
                latency: Duration::ZERO,
                requests: Vec::new(),
                status_queries: Vec::new(),
            })),
        }
    }

    pub async fn set_initiate_reply(&self, reply: InitiateReply) {
        self.script.write().await.initiate = reply;
    }

    pub async fn push_status(&self, reply: StatusReply) {
        self.script.write().await.statuses.push_back(reply);
    }

    pub async fn push_statuses(&self, replies: impl IntoIterator<Item = StatusReply>) {
        self.script.write().await.statuses.extend(replies);
    }

    pub async fn set_fallback_status(&self, reply: StatusReply) {
        self.script.write().await.fallback = reply;
    }

    /// Delay applied to every call before it answers.
    pub async fn set_latency(&self, latency: Duration) {
        self.script.write().await.latency = latency;
    }

    pub async fn initiate_calls(&self) -> usize {
        self.script.read().await.requests.len()
    }

    pub async fn status_calls(&self) -> usize {
        self.script.read().await.status_queries.len()
    }

    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.script.read().await.requests.clone()
    }

    pub async fn status_queries(&self) -> Vec<String> {
        self.script.read().await.status_queries.clone()
    }

    async fn latency(&self) -> Duration {
        self.script.read().await.latency
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<ApiResponse<CheckoutData>> {
        let reply = {
            let mut script = self.script.write().await;
            script.requests.push(request.clone());
            script.initiate.clone()
        };

        let latency = self.latency().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match reply {
            InitiateReply::Accept(data) => Ok(ApiResponse::ok(data)),
            InitiateReply::Reject(message) => Ok(ApiResponse::error(message)),
            InitiateReply::Error(message) => Err(PaymentError::Transient(message)),
        }
    }

    async fn payment_status(&self, checkout_request_id: &str) -> Result<ApiResponse<StatusData>> {
        let reply = {
            let mut script = self.script.write().await;
            script.status_queries.push(checkout_request_id.to_string());
            let fallback = script.fallback.clone();
            script.statuses.pop_front().unwrap_or(fallback)
        };

        let latency = self.latency().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match reply {
            StatusReply::Status(data) => Ok(ApiResponse::ok(data)),
            StatusReply::Reject(message) => Ok(ApiResponse::error(message)),
            StatusReply::Error(message) => Err(PaymentError::Transient(message)),
        }
    }
}
