use crate::controller::menu::MenuSelection;
use crate::utils::types::{ConvertedDocument, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Error while delivering a message through the chat platform
#[derive(Debug, Error)]
#[error("failed to deliver message: {0}")]
pub struct MessengerError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Outbound side of the chat platform
#[async_trait]
pub trait Messenger {
    async fn send_text(&self, user: UserId, message: &str) -> Result<(), MessengerError>;

    async fn send_menu(
        &self,
        user: UserId,
        prompt: &str,
        options: &[MenuSelection],
    ) -> Result<(), MessengerError>;

    async fn send_document(
        &self,
        user: UserId,
        document: ConvertedDocument,
    ) -> Result<(), MessengerError>;
}
