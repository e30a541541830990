//! Conversation scenarios driven through the controller with an in-memory
//! messenger standing in for the chat platform.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img2pdf_bot::controller::menu::{MENU_PROMPT, MenuSelection};
use img2pdf_bot::controller::messenger::{Messenger, MessengerError};
use img2pdf_bot::controller::{
    ControllerSettings, ConversationController, IMAGE_SAVED_MESSAGE, InboundEvent,
    NO_IMAGES_TO_RESIZE_MESSAGE, UPLOAD_FAILED_MESSAGE, WELCOME_MESSAGE, WIDTH_HEIGHT_PROMPT,
};
use img2pdf_bot::image_ops::document::{DEFAULT_DOCUMENT_FILENAME, DocumentAssembler};
use img2pdf_bot::image_ops::image_types::PageEncoding;
use img2pdf_bot::image_ops::resize::SizeLimit;
use img2pdf_bot::store::image_store::{ImageStore, MemoryImageStore};
use img2pdf_bot::store::pending_input::{
    InputWaitState, MemoryPendingInputTracker, PendingInputTracker,
};
use img2pdf_bot::utils::types::{ConvertedDocument, UserId};
use lopdf::Document;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// ── Test helpers ─────────────────────────────────────────────────────────────

const USER: UserId = 1001;

#[derive(Debug, Clone)]
enum Outbound {
    Text(UserId, String),
    Menu(UserId, String, Vec<MenuSelection>),
    Document(UserId, ConvertedDocument),
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<Outbound>>,
}

impl RecordingMessenger {
    async fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, user: UserId, message: &str) -> Result<(), MessengerError> {
        self.sent
            .lock()
            .await
            .push(Outbound::Text(user, message.to_string()));
        Ok(())
    }

    async fn send_menu(
        &self,
        user: UserId,
        prompt: &str,
        options: &[MenuSelection],
    ) -> Result<(), MessengerError> {
        self.sent
            .lock()
            .await
            .push(Outbound::Menu(user, prompt.to_string(), options.to_vec()));
        Ok(())
    }

    async fn send_document(
        &self,
        user: UserId,
        document: ConvertedDocument,
    ) -> Result<(), MessengerError> {
        self.sent
            .lock()
            .await
            .push(Outbound::Document(user, document));
        Ok(())
    }
}

struct Harness {
    controller: ConversationController,
    messenger: Arc<RecordingMessenger>,
    images: Arc<RwLock<MemoryImageStore>>,
    pending: Arc<RwLock<MemoryPendingInputTracker>>,
}

impl Harness {
    fn new(settings: ControllerSettings) -> Self {
        let messenger = Arc::new(RecordingMessenger::default());
        let images = Arc::new(RwLock::new(MemoryImageStore::new()));
        let pending = Arc::new(RwLock::new(MemoryPendingInputTracker::new()));
        let controller = ConversationController::new(
            images.clone(),
            pending.clone(),
            DocumentAssembler::new(PageEncoding::Flate, 90, None),
            messenger.clone(),
            settings,
        );
        Harness {
            controller,
            messenger,
            images,
            pending,
        }
    }

    async fn send(&self, event: InboundEvent) {
        self.controller.handle(USER, event).await.unwrap();
    }

    async fn upload(&self, width: u32, height: u32) {
        self.send(InboundEvent::Image(png_bytes(width, height))).await;
    }

    async fn pending_count(&self) -> usize {
        self.images.read().await.count(USER).await
    }

    async fn waiting(&self) -> InputWaitState {
        self.pending.read().await.get_waiting(USER).await
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Page sizes in points, in page order
fn page_sizes(data: &[u8]) -> Vec<(i64, i64)> {
    let doc = Document::load_mem(data).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            (
                media_box[2].as_i64().unwrap(),
                media_box[3].as_i64().unwrap(),
            )
        })
        .collect()
}

fn texts(outbound: &[Outbound]) -> Vec<&str> {
    outbound
        .iter()
        .filter_map(|event| match event {
            Outbound::Text(_, text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn documents(outbound: &[Outbound]) -> Vec<&ConvertedDocument> {
    outbound
        .iter()
        .filter_map(|event| match event {
            Outbound::Document(_, document) => Some(document),
            _ => None,
        })
        .collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_sends_welcome() {
    let h = Harness::new(ControllerSettings::default());
    h.send(InboundEvent::Start).await;

    let sent = h.messenger.take().await;
    assert_eq!(texts(&sent), vec![WELCOME_MESSAGE]);
}

#[tokio::test]
async fn three_images_at_half_size() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(40, 20).await;
    h.upload(60, 30).await;
    h.upload(80, 44).await;
    assert_eq!(
        texts(&h.messenger.take().await),
        vec![IMAGE_SAVED_MESSAGE; 3]
    );

    h.send(InboundEvent::ConvertCommand).await;
    let sent = h.messenger.take().await;
    match sent.as_slice() {
        [Outbound::Menu(user, prompt, options)] => {
            assert_eq!(*user, USER);
            assert_eq!(prompt, MENU_PROMPT);
            assert_eq!(options.as_slice(), MenuSelection::ALL.as_slice());
        }
        other => panic!("expected a menu, got {other:?}"),
    }

    h.send(InboundEvent::MenuSelection(MenuSelection::Half)).await;
    let sent = h.messenger.take().await;

    let docs = documents(&sent);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].page_count, 3);
    assert_eq!(docs[0].filename, DEFAULT_DOCUMENT_FILENAME);
    assert_eq!(
        page_sizes(&docs[0].data),
        vec![(20, 10), (30, 15), (40, 22)]
    );
    assert_eq!(texts(&sent), vec!["✅ Converted with 50% size."]);
    assert_eq!(h.pending_count().await, 0);
}

#[tokio::test]
async fn original_size_keeps_dimensions() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(33, 17).await;
    h.messenger.take().await;

    h.send(InboundEvent::MenuSelection(MenuSelection::OriginalSize))
        .await;
    let sent = h.messenger.take().await;

    assert_eq!(page_sizes(&documents(&sent)[0].data), vec![(33, 17)]);
    assert_eq!(texts(&sent), vec!["✅ Converted with 100% size."]);
}

#[tokio::test]
async fn convert_without_images_is_an_error() {
    let h = Harness::new(ControllerSettings::default());
    h.send(InboundEvent::ConvertCommand).await;

    let sent = h.messenger.take().await;
    assert_eq!(
        texts(&sent),
        vec!["❌ No images found. Please send some images first."]
    );
    assert!(documents(&sent).is_empty());
}

#[tokio::test]
async fn menu_selection_without_images_is_an_error() {
    let h = Harness::new(ControllerSettings::default());
    h.send(InboundEvent::MenuSelection(MenuSelection::CustomPercentPrompt))
        .await;

    assert_eq!(
        texts(&h.messenger.take().await),
        vec![NO_IMAGES_TO_RESIZE_MESSAGE]
    );
    assert_eq!(h.waiting().await, InputWaitState::None);
}

#[tokio::test]
async fn invalid_percent_requires_choosing_the_option_again() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(20, 10).await;
    h.send(InboundEvent::MenuSelection(MenuSelection::CustomPercentPrompt))
        .await;
    assert_eq!(h.waiting().await, InputWaitState::AwaitingPercent);
    assert_eq!(
        texts(&h.messenger.take().await),
        vec![IMAGE_SAVED_MESSAGE, "🔢 Send resize percentage (1–200):"]
    );

    h.send(InboundEvent::Text("300".into())).await;
    assert_eq!(
        texts(&h.messenger.take().await),
        vec!["❗ Please send a valid number (1–200)."]
    );
    assert_eq!(h.waiting().await, InputWaitState::None);
    assert_eq!(h.pending_count().await, 1);

    // not waiting anymore, the reply is ignored
    h.send(InboundEvent::Text("300".into())).await;
    assert!(h.messenger.take().await.is_empty());

    h.send(InboundEvent::MenuSelection(MenuSelection::CustomPercentPrompt))
        .await;
    h.send(InboundEvent::Text("150".into())).await;
    let sent = h.messenger.take().await;
    assert_eq!(page_sizes(&documents(&sent)[0].data), vec![(30, 15)]);
    assert_eq!(h.pending_count().await, 0);
    assert_eq!(h.waiting().await, InputWaitState::None);
}

#[tokio::test]
async fn invalid_percent_can_keep_waiting() {
    let h = Harness::new(ControllerSettings {
        keep_waiting_on_invalid_input: true,
        ..ControllerSettings::default()
    });
    h.upload(20, 10).await;
    h.send(InboundEvent::MenuSelection(MenuSelection::CustomPercentPrompt))
        .await;
    h.messenger.take().await;

    for _ in 0..2 {
        h.send(InboundEvent::Text("300".into())).await;
        assert_eq!(
            texts(&h.messenger.take().await),
            vec!["❗ Please send a valid number (1–200)."]
        );
        assert_eq!(h.waiting().await, InputWaitState::AwaitingPercent);
        assert_eq!(h.pending_count().await, 1);
    }

    h.send(InboundEvent::Text("200".into())).await;
    let sent = h.messenger.take().await;
    assert_eq!(page_sizes(&documents(&sent)[0].data), vec![(40, 20)]);
    assert_eq!(h.waiting().await, InputWaitState::None);
}

#[tokio::test]
async fn width_height_ignores_aspect_ratio() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(30, 90).await;
    h.upload(100, 20).await;
    h.send(InboundEvent::MenuSelection(
        MenuSelection::CustomWidthHeightPrompt,
    ))
    .await;
    assert_eq!(h.waiting().await, InputWaitState::AwaitingWidthHeight);
    assert_eq!(
        texts(&h.messenger.take().await).last(),
        Some(&WIDTH_HEIGHT_PROMPT)
    );

    h.send(InboundEvent::Text(" 80X60 ".into())).await;
    let sent = h.messenger.take().await;

    let docs = documents(&sent);
    assert_eq!(docs.len(), 1);
    assert_eq!(page_sizes(&docs[0].data), vec![(80, 60), (80, 60)]);
    assert!(texts(&sent).is_empty());
    assert_eq!(h.pending_count().await, 0);
    assert_eq!(h.waiting().await, InputWaitState::None);
}

#[tokio::test]
async fn malformed_width_height_keeps_images() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(30, 90).await;
    h.send(InboundEvent::MenuSelection(
        MenuSelection::CustomWidthHeightPrompt,
    ))
    .await;
    h.messenger.take().await;

    h.send(InboundEvent::Text("800 by 600".into())).await;
    assert_eq!(
        texts(&h.messenger.take().await),
        vec!["❗ Format error. Please send like `800x600`"]
    );
    assert_eq!(h.pending_count().await, 1);
    assert_eq!(h.waiting().await, InputWaitState::None);
}

#[tokio::test]
async fn text_without_prompt_is_ignored() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(10, 10).await;
    h.messenger.take().await;

    h.send(InboundEvent::Text("50".into())).await;
    assert!(h.messenger.take().await.is_empty());
    assert_eq!(h.pending_count().await, 1);
}

#[tokio::test]
async fn broken_upload_is_rejected() {
    let h = Harness::new(ControllerSettings::default());
    h.send(InboundEvent::Image(b"not an image at all".to_vec()))
        .await;

    let sent = h.messenger.take().await;
    assert_eq!(sent.len(), 1);
    assert_ne!(texts(&sent), vec![IMAGE_SAVED_MESSAGE]);
    assert_eq!(h.pending_count().await, 0);
}

#[tokio::test]
async fn users_are_independent() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(10, 10).await;
    h.controller
        .handle(USER + 1, InboundEvent::ConvertCommand)
        .await
        .unwrap();

    let sent = h.messenger.take().await;
    match sent.last() {
        Some(Outbound::Text(user, text)) => {
            assert_eq!(*user, USER + 1);
            assert_eq!(text, "❌ No images found. Please send some images first.");
        }
        other => panic!("expected an error text, got {other:?}"),
    }
    assert_eq!(h.pending_count().await, 1);
}

#[tokio::test]
async fn concurrent_conversions_deliver_once() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(10, 10).await;
    h.upload(12, 12).await;
    h.messenger.take().await;

    let (first, second) = tokio::join!(
        h.controller
            .handle(USER, InboundEvent::MenuSelection(MenuSelection::Half)),
        h.controller
            .handle(USER, InboundEvent::MenuSelection(MenuSelection::Half)),
    );
    first.unwrap();
    second.unwrap();

    let sent = h.messenger.take().await;
    assert_eq!(documents(&sent).len(), 1);
    assert_eq!(documents(&sent)[0].page_count, 2);
    assert!(texts(&sent).contains(&NO_IMAGES_TO_RESIZE_MESSAGE));
}

#[tokio::test]
async fn percent_results_are_held_to_the_size_limit() {
    let h = Harness::new(ControllerSettings {
        size_limit: SizeLimit {
            width: 100,
            height: 100,
        },
        ..ControllerSettings::default()
    });
    h.upload(90, 90).await;
    h.send(InboundEvent::MenuSelection(MenuSelection::CustomPercentPrompt))
        .await;
    h.messenger.take().await;

    h.send(InboundEvent::Text("200".into())).await;
    let sent = h.messenger.take().await;
    assert!(documents(&sent).is_empty());
    assert_eq!(texts(&sent), vec!["❗ Size is too large. Maximum is 100x100."]);
    assert_eq!(h.pending_count().await, 1);
    assert_eq!(h.waiting().await, InputWaitState::None);

    // the same images still convert within the limit
    h.send(InboundEvent::MenuSelection(MenuSelection::Half)).await;
    let sent = h.messenger.take().await;
    assert_eq!(page_sizes(&documents(&sent)[0].data), vec![(45, 45)]);
    assert_eq!(h.pending_count().await, 0);
}

#[tokio::test]
async fn failed_download_asks_to_resend() {
    let h = Harness::new(ControllerSettings::default());
    h.upload(10, 10).await;
    h.messenger.take().await;

    h.send(InboundEvent::UploadFailed).await;
    assert_eq!(
        texts(&h.messenger.take().await),
        vec![UPLOAD_FAILED_MESSAGE]
    );
    assert_eq!(h.pending_count().await, 1);
}
