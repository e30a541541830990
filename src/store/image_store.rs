use crate::utils::types::UserId;
use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;

/// Decoded upload waiting for conversion, shared cheaply between store and workers
pub type PendingImage = Arc<DynamicImage>;

/// Per-user ordered collection of uploaded images awaiting conversion.
///
/// A user without an entry is the same as a user with an empty collection.
#[async_trait]
pub trait ImageStore {
    /// Appends to the end of the user's collection
    async fn add_image(&mut self, user: UserId, image: PendingImage);

    /// Images in upload order, empty for unknown users
    async fn get_images(&self, user: UserId) -> Vec<PendingImage>;

    async fn count(&self, user: UserId) -> usize;

    async fn clear(&mut self, user: UserId);
}

/// Store implementation keeping everything in process memory
#[derive(Default)]
pub struct MemoryImageStore {
    images: HashMap<UserId, Vec<PendingImage>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        MemoryImageStore::default()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn add_image(&mut self, user: UserId, image: PendingImage) {
        self.images.entry(user).or_default().push(image);
    }

    async fn get_images(&self, user: UserId) -> Vec<PendingImage> {
        self.images.get(&user).cloned().unwrap_or_default()
    }

    async fn count(&self, user: UserId) -> usize {
        self.images.get(&user).map_or(0, Vec::len)
    }

    async fn clear(&mut self, user: UserId) {
        self.images.remove(&user);
    }
}
