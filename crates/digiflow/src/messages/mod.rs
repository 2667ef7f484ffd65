//! User-facing message handling.
//!
//! [`MessageCatalog`] resolves message keys to localized text. Catalogs
//! are loaded once per locale from embedded JSON and are immutable
//! afterwards, so they can be shared freely across threads.
//!
//! [`MessageLog`] collects the info and error messages produced by an
//! operation so callers can present them after the fact instead of
//! relying on shared mutable session state.

use std::collections::HashMap;

const LOCALE_EN: &str = include_str!("locales/en.json");
const LOCALE_DE: &str = include_str!("locales/de.json");

/// An immutable key -> text catalog for one locale.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: String,
    entries: HashMap<String, String>,
}

impl MessageCatalog {
    /// Loads the catalog for the given locale. Unknown locales fall back
    /// to English.
    pub fn load(locale: &str) -> Self {
        let raw = match locale {
            "de" => LOCALE_DE,
            _ => LOCALE_EN,
        };
        // Embedded catalogs are validated by tests, a parse failure here
        // would be a build defect.
        let entries: HashMap<String, String> =
            serde_json::from_str(raw).unwrap_or_default();
        Self {
            locale: locale.to_string(),
            entries,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Resolves a key to its text. Unknown keys resolve to the key itself
    /// so a missing translation stays visible instead of vanishing.
    pub fn resolve(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Resolves a key and substitutes `{0}`, `{1}`, ... placeholders.
    pub fn resolve_with(&self, key: &str, args: &[&str]) -> String {
        let mut text = self.resolve(key);
        for (i, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{}}}", i), arg);
        }
        text
    }
}

/// Severity of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// A single collected message.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

/// Collects messages produced during an operation.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::info!("{}", text);
        self.entries.push(Message {
            kind: MessageKind::Info,
            text,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{}", text);
        self.entries.push(Message {
            kind: MessageKind::Error,
            text,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|m| m.kind == MessageKind::Error)
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Texts of all error messages, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|m| m.kind == MessageKind::Error)
            .map(|m| m.text.as_str())
            .collect()
    }
}
