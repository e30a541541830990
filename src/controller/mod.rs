pub mod menu;
pub mod messenger;

use crate::errors::{ConversionError, INTERNAL_FAILURE_MESSAGE};
use crate::image_ops::decode::decode;
use crate::image_ops::document::DocumentAssembler;
use crate::image_ops::resize::{
    ORIGINAL_SIZE_PERCENT, PercentRange, ResizePlan, ResizeRequest, SizeLimit,
    parse_percent_input, parse_width_height_input, resize_all, resolve_fixed,
};
use crate::store::image_store::ImageStore;
use crate::store::pending_input::{InputWaitState, PendingInputTracker};
use crate::store::user_locks::UserLocks;
use crate::utils::types::{ConvertedDocument, UserId};
use log::{debug, error, info, warn};
use menu::{MENU_PROMPT, MenuSelection};
use messenger::{Messenger, MessengerError};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::spawn_blocking;
use tracing::instrument;

pub const WELCOME_MESSAGE: &str = "📸 Welcome to Image to PDF Bot!\n\n➕ Send images\n⚙️ Use /convert to choose resize and make PDF.";
pub const IMAGE_SAVED_MESSAGE: &str = "✅ Image saved. Use /convert to make PDF.";
pub const NO_IMAGES_TO_RESIZE_MESSAGE: &str = "❌ No images to resize.";
pub const UPLOAD_FAILED_MESSAGE: &str = "⚠️ Could not download your file. Please send it again.";
pub const WIDTH_HEIGHT_PROMPT: &str = "📐 Send width x height like `800x600`:";

/// Event coming from the chat platform for a single user
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Start,
    Image(Vec<u8>),
    /// An upload was announced but its bytes could not be fetched
    UploadFailed,
    ConvertCommand,
    MenuSelection(MenuSelection),
    Text(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerSettings {
    pub percent_range: PercentRange,
    pub size_limit: SizeLimit,
    /// Keep waiting for a custom reply after an invalid one instead of
    /// requiring the user to pick the option from the menu again
    pub keep_waiting_on_invalid_input: bool,
}

/// Drives the collect → choose size → convert workflow of every user.
///
/// All events of one user are handled under that user's lock, so a
/// conversion never races with an upload or another conversion of the same
/// user. Resizing and document assembly run on the blocking pool.
pub struct ConversationController {
    images: Arc<RwLock<dyn ImageStore + Send + Sync>>,
    pending: Arc<RwLock<dyn PendingInputTracker + Send + Sync>>,
    assembler: Arc<DocumentAssembler>,
    messenger: Arc<dyn Messenger + Send + Sync>,
    locks: UserLocks,
    settings: ControllerSettings,
}

impl ConversationController {
    pub fn new(
        images: Arc<RwLock<dyn ImageStore + Send + Sync>>,
        pending: Arc<RwLock<dyn PendingInputTracker + Send + Sync>>,
        assembler: DocumentAssembler,
        messenger: Arc<dyn Messenger + Send + Sync>,
        settings: ControllerSettings,
    ) -> Self {
        ConversationController {
            images,
            pending,
            assembler: Arc::new(assembler),
            messenger,
            locks: UserLocks::new(),
            settings,
        }
    }

    /// Handle one inbound event; only delivery failures are returned
    pub async fn handle(&self, user: UserId, event: InboundEvent) -> Result<(), MessengerError> {
        let _guard = self.locks.lock(user).await;
        match event {
            InboundEvent::Start => self.on_start(user).await,
            InboundEvent::Image(data) => self.on_image(user, data).await,
            InboundEvent::UploadFailed => {
                self.messenger.send_text(user, UPLOAD_FAILED_MESSAGE).await
            }
            InboundEvent::ConvertCommand => self.on_convert_command(user).await,
            InboundEvent::MenuSelection(selection) => {
                self.on_menu_selection(user, selection).await
            }
            InboundEvent::Text(text) => self.on_text(user, &text).await,
        }
    }

    async fn on_start(&self, user: UserId) -> Result<(), MessengerError> {
        self.messenger.send_text(user, WELCOME_MESSAGE).await
    }

    #[instrument(skip_all, fields(user = user, size = data.len()))]
    async fn on_image(&self, user: UserId, data: Vec<u8>) -> Result<(), MessengerError> {
        let decoded = spawn_blocking(move || decode(&data)).await;
        let image = match decoded {
            Ok(Ok(image)) => image,
            Ok(Err(err)) => {
                warn!("Rejected upload from user {}: {}", user, err);
                return self.messenger.send_text(user, err.user_message()).await;
            }
            Err(err) => {
                error!("Decoding worker failed for user {}: {}", user, err);
                return self.messenger.send_text(user, INTERNAL_FAILURE_MESSAGE).await;
            }
        };

        let pending_count = {
            let mut images = self.images.write().await;
            images.add_image(user, Arc::new(image)).await;
            images.count(user).await
        };
        info!("User {} has {} pending images", user, pending_count);

        self.messenger.send_text(user, IMAGE_SAVED_MESSAGE).await
    }

    #[instrument(skip_all, fields(user = user))]
    async fn on_convert_command(&self, user: UserId) -> Result<(), MessengerError> {
        if self.images.read().await.count(user).await == 0 {
            let err = ConversionError::EmptyCollection;
            return self.messenger.send_text(user, &err.user_message()).await;
        }

        self.messenger
            .send_menu(user, MENU_PROMPT, &MenuSelection::ALL)
            .await
    }

    #[instrument(skip_all, fields(user = user))]
    async fn on_menu_selection(
        &self,
        user: UserId,
        selection: MenuSelection,
    ) -> Result<(), MessengerError> {
        if self.images.read().await.count(user).await == 0 {
            return self
                .messenger
                .send_text(user, NO_IMAGES_TO_RESIZE_MESSAGE)
                .await;
        }

        let percent = match selection.request() {
            ResizeRequest::OriginalSize => ORIGINAL_SIZE_PERCENT,
            ResizeRequest::FixedPercent(percent) => percent,
            ResizeRequest::CustomPercent => {
                return self
                    .await_input(user, InputWaitState::AwaitingPercent)
                    .await;
            }
            ResizeRequest::CustomWidthHeight => {
                return self
                    .await_input(user, InputWaitState::AwaitingWidthHeight)
                    .await;
            }
        };

        // a fixed choice supersedes an unanswered custom prompt
        self.pending.write().await.clear_waiting(user).await;

        if self.convert_and_deliver(user, resolve_fixed(percent)).await? {
            self.messenger
                .send_text(user, &format!("✅ Converted with {}% size.", percent))
                .await?;
        }
        Ok(())
    }

    async fn await_input(
        &self,
        user: UserId,
        state: InputWaitState,
    ) -> Result<(), MessengerError> {
        self.pending.write().await.set_waiting(user, state).await;
        debug!("User {} is now {}", user, state);

        let prompt = match state {
            InputWaitState::AwaitingPercent => format!(
                "🔢 Send resize percentage ({}–{}):",
                self.settings.percent_range.min, self.settings.percent_range.max
            ),
            _ => WIDTH_HEIGHT_PROMPT.to_string(),
        };
        self.messenger.send_text(user, &prompt).await
    }

    #[instrument(skip_all, fields(user = user))]
    async fn on_text(&self, user: UserId, text: &str) -> Result<(), MessengerError> {
        let text = text.trim();
        let parsed = match self.pending.read().await.get_waiting(user).await {
            InputWaitState::None => {
                debug!("Ignoring text from user {} without pending prompt", user);
                return Ok(());
            }
            InputWaitState::AwaitingPercent => {
                parse_percent_input(text, self.settings.percent_range)
            }
            InputWaitState::AwaitingWidthHeight => {
                parse_width_height_input(text, self.settings.size_limit)
            }
        };

        match parsed {
            Err(err) => {
                info!("Invalid resize reply from user {}: {}", user, err);
                if !self.settings.keep_waiting_on_invalid_input {
                    self.pending.write().await.clear_waiting(user).await;
                }
                self.messenger.send_text(user, &err.user_message()).await
            }
            Ok(plan) => {
                self.pending.write().await.clear_waiting(user).await;
                self.convert_and_deliver(user, plan).await.map(|_| ())
            }
        }
    }

    /// Convert the user's pending images and send the document.
    ///
    /// The pending set is cleared only after the document was delivered;
    /// returns whether that happened.
    async fn convert_and_deliver(
        &self,
        user: UserId,
        plan: ResizePlan,
    ) -> Result<bool, MessengerError> {
        match self.convert(user, plan).await {
            Ok(document) => {
                info!(
                    "Delivering {} page document to user {}",
                    document.page_count, user
                );
                self.messenger.send_document(user, document).await?;
                self.images.write().await.clear(user).await;
                Ok(true)
            }
            Err(err) => {
                if err.is_internal() {
                    error!("Conversion failed for user {}: {}", user, err);
                }
                self.messenger.send_text(user, &err.user_message()).await?;
                Ok(false)
            }
        }
    }

    async fn convert(
        &self,
        user: UserId,
        plan: ResizePlan,
    ) -> Result<ConvertedDocument, ConversionError> {
        let images = self.images.read().await.get_images(user).await;
        if images.is_empty() {
            return Err(ConversionError::EmptyCollection);
        }

        let assembler = self.assembler.clone();
        let size_limit = self.settings.size_limit;
        let start = Instant::now();
        let document = spawn_blocking(move || -> Result<ConvertedDocument, ConversionError> {
            let resize_start = Instant::now();
            let resized = resize_all(images.as_slice(), plan, size_limit)?;
            let resize_time = resize_start.elapsed();
            if resize_time.as_millis() > 200 {
                debug!("Resizing {} images took {:?}", resized.len(), resize_time);
            }

            Ok(assembler.assemble(&resized)?)
        })
        .await??;

        let total_time = start.elapsed();
        if total_time.as_millis() > 500 {
            debug!("Conversion took {:?} for user {}", total_time, user);
        }
        Ok(document)
    }
}
