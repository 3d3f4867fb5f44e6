//! Context-to-request normalization.
//!
//! The Responses API accepts tool output only as `function_call_output` bound
//! to a call of the response being continued. Tool messages replayed from
//! history have no such live call, so they travel as assistant text.

use crate::types::{InputItem, Message, Role};

/// Convert context messages into request input items.
pub(super) fn context_to_input(context: &[Message]) -> Vec<InputItem> {
    context.iter().filter_map(to_input_item).collect()
}

fn to_input_item(message: &Message) -> Option<InputItem> {
    if message.content.is_empty() {
        return None;
    }
    let role = match message.role {
        Role::Tool => Role::Assistant,
        role => role,
    };
    Some(InputItem::Message {
        role,
        content: message.content.clone(),
    })
}
