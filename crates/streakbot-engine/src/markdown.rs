// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 building blocks for Telegram messages.
//!
//! Telegram rejects MarkdownV2 text containing an unescaped special
//! character, so every user-supplied fragment (names, quest descriptions,
//! quotes) goes through [`escape`] before it is placed into a template.

use streakbot_core::UserId;

/// Characters that must be escaped in MarkdownV2 outside code blocks.
const SPECIAL_CHARS: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape `text` so it renders literally.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Bold, escaped text.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape(text))
}

/// A mention link that notifies the user even without a public username.
pub fn mention(user_id: UserId, name: &str) -> String {
    let label = if name.trim().is_empty() {
        format!("user {user_id}")
    } else {
        name.to_string()
    };
    format!("[{}](tg://user?id={user_id})", escape(&label))
}

/// Undo [`escape`] and drop the formatting markers, for plain-text fallbacks.
pub fn to_plain(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut chars = markdown.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '_' | '~' => {}
            _ => out.push(ch),
        }
    }
    out
}
