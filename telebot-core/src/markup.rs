//! Keyboard markup builder.
//!
//! Pure construction of reply and inline keyboards. A [`KeyboardSpec`] is immutable once built and
//! its [`Display`](std::fmt::Display) output is the JSON text attached as `reply_markup`.

use std::fmt;

use serde::Serialize;

/// Label of the button appended by `append_delete`.
pub const DELETE_BUTTON_LABEL: &str = "❌ Delete";
/// Callback payload of the delete button.
pub const DELETE_CALLBACK_DATA: &str = "delete";

/// One inline-keyboard button. Exactly what is serialized: absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    /// Button that produces a callback event with `data` as payload.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// Button that only opens `url`.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }

    /// Attaches a URL; an empty string leaves the button unchanged.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.url = Some(url);
        }
        self
    }
}

/// A reply keyboard or an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyboardSpec {
    Reply {
        keyboard: Vec<Vec<String>>,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineButton>>,
    },
}

impl KeyboardSpec {
    /// Reply keyboard, one row per `[first, second]` pair. An empty second label is omitted.
    pub fn reply<S: AsRef<str>>(rows: &[[S; 2]], resize: bool, one_time: bool) -> Self {
        let keyboard = rows
            .iter()
            .map(|[first, second]| {
                let mut row = vec![first.as_ref().to_string()];
                if !second.as_ref().is_empty() {
                    row.push(second.as_ref().to_string());
                }
                row
            })
            .collect();
        KeyboardSpec::Reply {
            keyboard,
            resize_keyboard: resize,
            one_time_keyboard: one_time,
        }
    }

    /// Inline keyboard with one button per row, optionally followed by the delete row.
    pub fn inline(buttons: &[InlineButton], append_delete: bool) -> Self {
        let mut inline_keyboard: Vec<Vec<InlineButton>> =
            buttons.iter().map(|b| vec![b.clone()]).collect();
        if append_delete {
            inline_keyboard.push(vec![InlineButton::callback(
                DELETE_BUTTON_LABEL,
                DELETE_CALLBACK_DATA,
            )]);
        }
        KeyboardSpec::Inline { inline_keyboard }
    }

    /// Inline keyboard of link buttons, one `[label, url]` pair per row.
    pub fn urls<S: AsRef<str>>(rows: &[[S; 2]]) -> Self {
        let inline_keyboard = rows
            .iter()
            .map(|[label, url]| vec![InlineButton::link(label.as_ref(), url.as_ref())])
            .collect();
        KeyboardSpec::Inline { inline_keyboard }
    }

    pub fn row_count(&self) -> usize {
        match self {
            KeyboardSpec::Reply { keyboard, .. } => keyboard.len(),
            KeyboardSpec::Inline { inline_keyboard } => inline_keyboard.len(),
        }
    }
}

impl fmt::Display for KeyboardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Serialized reply keyboard.
pub fn build_reply_keyboard<S: AsRef<str>>(
    rows: &[[S; 2]],
    resize: bool,
    one_time: bool,
) -> String {
    KeyboardSpec::reply(rows, resize, one_time).to_string()
}

/// Serialized inline keyboard built from `[label, callback_data, url]` triples.
pub fn build_inline_keyboard<S: AsRef<str>>(rows: &[[S; 3]], append_delete: bool) -> String {
    let buttons: Vec<InlineButton> = rows
        .iter()
        .map(|[label, data, url]| {
            InlineButton::callback(label.as_ref(), data.as_ref()).with_url(url.as_ref())
        })
        .collect();
    KeyboardSpec::inline(&buttons, append_delete).to_string()
}

/// Serialized inline keyboard of `[label, url]` link buttons.
pub fn build_url_keyboard<S: AsRef<str>>(rows: &[[S; 2]]) -> String {
    KeyboardSpec::urls(rows).to_string()
}
