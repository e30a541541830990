use crate::utils::types::UserId;
use async_trait::async_trait;
use std::collections::HashMap;

/// Kind of text reply expected next from a user
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Default, strum::Display)]
pub enum InputWaitState {
    #[default]
    None,
    AwaitingPercent,
    AwaitingWidthHeight,
}

#[async_trait]
pub trait PendingInputTracker {
    async fn set_waiting(&mut self, user: UserId, state: InputWaitState);

    async fn clear_waiting(&mut self, user: UserId);

    /// Current state, `InputWaitState::None` for unknown users
    async fn get_waiting(&self, user: UserId) -> InputWaitState;
}

#[derive(Default)]
pub struct MemoryPendingInputTracker {
    waiting: HashMap<UserId, InputWaitState>,
}

impl MemoryPendingInputTracker {
    pub fn new() -> Self {
        MemoryPendingInputTracker::default()
    }
}

#[async_trait]
impl PendingInputTracker for MemoryPendingInputTracker {
    async fn set_waiting(&mut self, user: UserId, state: InputWaitState) {
        match state {
            InputWaitState::None => {
                self.waiting.remove(&user);
            }
            state => {
                self.waiting.insert(user, state);
            }
        }
    }

    async fn clear_waiting(&mut self, user: UserId) {
        self.waiting.remove(&user);
    }

    async fn get_waiting(&self, user: UserId) -> InputWaitState {
        self.waiting.get(&user).copied().unwrap_or_default()
    }
}
