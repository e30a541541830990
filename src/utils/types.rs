use crate::image_ops::document::DEFAULT_DOCUMENT_FILENAME;

/// Chat platform user identifier, numeric on every platform we talk to
pub type UserId = u64;

/// Assembled document ready to be handed to the transport
#[derive(Clone, Debug)]
pub struct ConvertedDocument {
    pub data: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

impl ConvertedDocument {
    pub fn new(data: Vec<u8>, filename: Option<String>, page_count: usize) -> Self {
        ConvertedDocument {
            data,
            filename: filename.unwrap_or(DEFAULT_DOCUMENT_FILENAME.to_string()),
            page_count,
        }
    }
}
