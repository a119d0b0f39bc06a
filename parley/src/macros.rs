/// Creates a single [`ChatMessage`](crate::ChatMessage) from a role shorthand.
///
/// ```rust
/// use parley::{Role, parley_msg};
///
/// let message = parley_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.text, "Done.");
/// ```
#[macro_export]
macro_rules! parley_msg {
    (system => $text:expr $(,)?) => {
        $crate::ChatMessage::new($crate::Role::System, $text)
    };
    (user => $text:expr $(,)?) => {
        $crate::ChatMessage::new($crate::Role::User, $text)
    };
    (assistant => $text:expr $(,)?) => {
        $crate::ChatMessage::new($crate::Role::Assistant, $text)
    };
    (tool => $text:expr $(,)?) => {
        $crate::ChatMessage::new($crate::Role::Tool, $text)
    };
    ($role:ident => $text:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or tool");
    };
}

/// Creates a `Vec<ChatMessage>` from role/text pairs.
///
/// ```rust
/// use parley::{Role, parley_messages};
///
/// let messages = parley_messages![
///     system => "You are concise.",
///     user => "Summarize this repository.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! parley_messages {
    () => {
        Vec::<$crate::ChatMessage>::new()
    };
    ($($role:ident => $text:expr),+ $(,)?) => {
        vec![$($crate::parley_msg!($role => $text)),+]
    };
}
