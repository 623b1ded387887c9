use serde::{Deserialize, Serialize};

/// The header's projection of the chat engine's state. The chat engine is
/// the only writer; everything in this crate reads it through a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub started: bool,
}

impl ConversationState {
    pub const NOT_STARTED: Self = Self { started: false };
    pub const STARTED: Self = Self { started: true };

    pub fn new(started: bool) -> Self {
        Self { started }
    }
}
