use crate::controller::menu::MenuSelection;
use crate::controller::messenger::{Messenger, MessengerError};
use crate::controller::{ConversationController, InboundEvent};
use crate::utils::types::{ConvertedDocument, UserId};
use async_trait::async_trait;
use log::{debug, warn};
use std::str::FromStr;
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use teloxide::utils::command::BotCommands;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show how the bot works")]
    Start,
    #[command(description = "choose resize option and make a PDF")]
    Convert,
}

/// Telegram delivery of controller replies
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        TelegramMessenger { bot }
    }
}

/// Private chats share the numeric id of their user
fn chat_of(user: UserId) -> ChatId {
    ChatId(user as i64)
}

fn delivery_error(err: teloxide::RequestError) -> MessengerError {
    MessengerError(Box::new(err))
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, user: UserId, message: &str) -> Result<(), MessengerError> {
        self.bot
            .send_message(chat_of(user), message)
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn send_menu(
        &self,
        user: UserId,
        prompt: &str,
        options: &[MenuSelection],
    ) -> Result<(), MessengerError> {
        let keyboard = InlineKeyboardMarkup::new(options.iter().map(|option| {
            vec![InlineKeyboardButton::callback(
                option.label(),
                option.as_ref(),
            )]
        }));
        self.bot
            .send_message(chat_of(user), prompt)
            .reply_markup(keyboard)
            .await
            .map_err(delivery_error)?;
        Ok(())
    }

    async fn send_document(
        &self,
        user: UserId,
        document: ConvertedDocument,
    ) -> Result<(), MessengerError> {
        let file = InputFile::memory(document.data).file_name(document.filename);
        self.bot
            .send_document(chat_of(user), file)
            .await
            .map_err(delivery_error)?;
        Ok(())
    }
}

/// Poll updates and feed them into the controller until Ctrl-C
pub async fn run(bot: Bot, controller: Arc<ConversationController>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(command_handler),
                )
                .branch(dptree::endpoint(message_handler)),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn sender(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|user| user.id.0)
}

async fn command_handler(
    msg: Message,
    cmd: Command,
    controller: Arc<ConversationController>,
) -> HandlerResult {
    let Some(user) = sender(&msg) else {
        return Ok(());
    };
    let event = match cmd {
        Command::Start => InboundEvent::Start,
        Command::Convert => InboundEvent::ConvertCommand,
    };
    controller.handle(user, event).await?;
    Ok(())
}

async fn message_handler(
    bot: Bot,
    msg: Message,
    controller: Arc<ConversationController>,
) -> HandlerResult {
    let Some(user) = sender(&msg) else {
        return Ok(());
    };

    let event = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        // sizes are sorted ascending, the last one is the original
        upload_event(&bot, user, &photo.file.id).await
    } else if let Some(document) = msg.document().filter(|document| {
        document
            .mime_type
            .as_ref()
            .is_some_and(|mime| mime.essence_str().starts_with("image/"))
    }) {
        upload_event(&bot, user, &document.file.id).await
    } else if let Some(text) = msg.text().filter(|text| !text.starts_with('/')) {
        InboundEvent::Text(text.to_string())
    } else {
        debug!("Skipping unsupported message from user {}", user);
        return Ok(());
    };

    controller.handle(user, event).await?;
    Ok(())
}

async fn callback_handler(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<ConversationController>,
) -> HandlerResult {
    bot.answer_callback_query(query.id.clone()).await?;

    let selection = query
        .data
        .as_deref()
        .and_then(|data| MenuSelection::from_str(data).ok());
    let Some(selection) = selection else {
        warn!("Unknown menu selection {:?}", query.data);
        return Ok(());
    };

    controller
        .handle(query.from.id.0, InboundEvent::MenuSelection(selection))
        .await?;
    Ok(())
}

/// Fetch an uploaded file; a failed download still reaches the controller so
/// the user is told to resend
async fn upload_event(bot: &Bot, user: UserId, file_id: &str) -> InboundEvent {
    match download(bot, file_id).await {
        Ok(data) => InboundEvent::Image(data),
        Err(err) => {
            warn!("Failed to download upload of user {}: {}", user, err);
            InboundEvent::UploadFailed
        }
    }
}

async fn download(
    bot: &Bot,
    file_id: &str,
) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let file = bot.get_file(file_id).await?;
    let mut data = Vec::with_capacity(file.size as usize);
    bot.download_file(&file.path, &mut data).await?;
    Ok(data)
}
