//! Projection of a stored turn log into model context.

use crate::types::{Message, Role};

/// System directive first, then the stored log in insertion order.
///
/// Tool messages are kept only when bound to a call id and are rewritten to
/// `[tool:<name>] <content>` so the model can tell where the text came from.
pub fn build_context(system: &str, stored: &[Message]) -> Vec<Message> {
    let mut context = Vec::with_capacity(stored.len() + 1);
    context.push(Message::system(system));
    context.extend(stored.iter().filter_map(project));
    context
}

fn project(message: &Message) -> Option<Message> {
    if message.role != Role::Tool {
        return Some(message.clone());
    }
    let call_id = message.call_id()?;
    let name = message.tool_name.as_deref().unwrap_or_default();
    Some(Message::tool(
        name,
        call_id,
        format!("[tool:{name}] {}", message.content),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_comes_first_even_for_empty_log() {
        let context = build_context("be nice", &[]);
        assert_eq!(context, vec![Message::system("be nice")]);
    }

    #[test]
    fn tool_messages_are_prefixed_and_order_is_kept() {
        let stored = vec![
            Message::user("Capital of Japan?"),
            Message::tool("get_country_info", "call_1", "Capital: Tokyo"),
            Message::assistant("Tokyo."),
        ];
        let context = build_context("sys", &stored);
        assert_eq!(context.len(), 4);
        assert_eq!(context[1], stored[0]);
        assert_eq!(context[2].content, "[tool:get_country_info] Capital: Tokyo");
        assert_eq!(context[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(context[3], stored[2]);
    }

    #[test]
    fn tool_messages_without_call_id_are_dropped() {
        let mut orphan = Message::tool("get_exchange_rate", "", "Rate: 1");
        let stored = vec![Message::user("hi"), orphan.clone()];
        assert_eq!(build_context("sys", &stored).len(), 2);

        orphan.tool_call_id = None;
        assert_eq!(build_context("sys", &[orphan]).len(), 1);

        let blank = Message::tool("get_exchange_rate", "   ", "Rate: 1");
        assert_eq!(build_context("sys", &[blank]).len(), 1);
    }

    #[test]
    fn projection_does_not_touch_the_stored_log() {
        let stored = vec![Message::tool("get_country_info", "c", "x")];
        let _ = build_context("sys", &stored);
        assert_eq!(stored[0].content, "x");
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn message() -> impl Strategy<Value = Message> {
            let text = proptest::string::string_regex("[a-z ]{0,12}").expect("regex");
            let call = proptest::string::string_regex("[a-z0-9_]{0,4}").expect("regex");
            (0u8..4, text, call).prop_map(|(kind, text, call)| match kind {
                0 => Message::user(text),
                1 => Message::assistant(text),
                2 => Message::system(text),
                _ => Message::tool("get_country_info", call, text),
            })
        }

        proptest! {
            #[test]
            fn non_tool_messages_pass_through_in_order(
                stored in proptest::collection::vec(message(), 0..16)
            ) {
                let context = build_context("sys", &stored);
                prop_assert_eq!(&context[0], &Message::system("sys"));

                let kept: Vec<&Message> = stored
                    .iter()
                    .filter(|m| m.role != Role::Tool)
                    .collect();
                let projected: Vec<&Message> = context[1..]
                    .iter()
                    .filter(|m| m.role != Role::Tool)
                    .collect();
                prop_assert_eq!(kept, projected);

                let bound = stored.iter().filter(|m| m.call_id().is_some()).count();
                prop_assert_eq!(context.len(), 1 + kept.len() + bound);
                prop_assert!(context[1..]
                    .iter()
                    .filter(|m| m.role == Role::Tool)
                    .all(|m| m.content.starts_with("[tool:get_country_info] ")));
                prop_assert_eq!(
                    context[1..].iter().filter(|m| m.role == Role::Tool).count(),
                    bound
                );
            }
        }
    }
}
