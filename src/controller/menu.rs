use crate::image_ops::resize::{HALF_SIZE_PERCENT, ResizeRequest};
use strum::{AsRefStr, EnumString};

pub const MENU_PROMPT: &str = "Choose image resize option before converting:";

/// Options of the resize menu, serialized as the menu's callback data
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, EnumString, AsRefStr)]
pub enum MenuSelection {
    #[strum(serialize = "resize_100")]
    OriginalSize,
    #[strum(serialize = "resize_50")]
    Half,
    #[strum(serialize = "resize_custom_percent")]
    CustomPercentPrompt,
    #[strum(serialize = "resize_custom_wh")]
    CustomWidthHeightPrompt,
}

impl MenuSelection {
    /// Menu options in the order they are presented
    pub const ALL: [MenuSelection; 4] = [
        MenuSelection::OriginalSize,
        MenuSelection::Half,
        MenuSelection::CustomPercentPrompt,
        MenuSelection::CustomWidthHeightPrompt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuSelection::OriginalSize => "🔄 Original Size",
            MenuSelection::Half => "📏 50% Size",
            MenuSelection::CustomPercentPrompt => "🎯 Custom %",
            MenuSelection::CustomWidthHeightPrompt => "✍️ Width x Height",
        }
    }

    pub fn request(&self) -> ResizeRequest {
        match self {
            MenuSelection::OriginalSize => ResizeRequest::OriginalSize,
            MenuSelection::Half => ResizeRequest::FixedPercent(HALF_SIZE_PERCENT),
            MenuSelection::CustomPercentPrompt => ResizeRequest::CustomPercent,
            MenuSelection::CustomWidthHeightPrompt => ResizeRequest::CustomWidthHeight,
        }
    }
}
