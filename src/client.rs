use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote service rejected the call because a request quota is spent.
    #[error("request quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Other(String),
}

/// A text-generation backend that takes a prompt and returns the raw reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<String, ClientError>;
}
