pub mod image_store;
pub mod pending_input;
pub mod user_locks;
