//! Conversation state and the inline-query bodies sent to prompt views.
//!
//! Prompts are modeled as views whose `generated_content` field holds the
//! model output; inputs travel as filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, ShapeError};
use crate::query::InlineQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Conversation history. Owned by the caller and passed into each turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: text.into(),
        });
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: text.into(),
        });
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// One `- Sender: text` line per message.
    pub fn to_bullet_list(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("- {}: {}", m.sender.as_str(), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bullet list flattened to one line with commas removed, safe to pass
    /// as a filter value.
    pub fn single_line_history(&self) -> String {
        self.to_bullet_list()
            .replace(',', "")
            .replace("\r\n", " ")
            .replace(|c: char| c == '\n' || c == '\r', " ")
    }
}

/// Strip commas and anything other than word characters, whitespace and
/// `. ( ) ? -` from user input.
pub fn clean_user_input(input: &str) -> String {
    input
        .chars()
        .filter(|&c| {
            c.is_alphanumeric()
                || c == '_'
                || c.is_whitespace()
                || matches!(c, '.' | '(' | ')' | '?' | '-')
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Rows JSON rewritten with single quotes and no escapes, the form the
/// summary prompt expects.
pub fn summary_input(rows_json: &str) -> String {
    rows_json
        .replace("\\u0027", "'")
        .replace('\\', "")
        .replace('"', "'")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptView {
    Chat,
    Summary,
}

impl PromptView {
    pub fn name(self) -> &'static str {
        match self {
            PromptView::Chat => "chat_prompt",
            PromptView::Summary => "summary_prompt",
        }
    }

    pub fn output_field(self) -> String {
        format!("{}.generated_content", self.name())
    }
}

/// Model and explore the user is asking about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreRef {
    pub model: String,
    pub explore: String,
}

/// Builds prompt-view queries against the model hosting the prompts.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    prompt_model: String,
}

impl PromptRequest {
    pub fn new(prompt_model: impl Into<String>) -> Self {
        Self {
            prompt_model: prompt_model.into(),
        }
    }

    fn query(&self, view: PromptView, filters: BTreeMap<String, String>) -> InlineQuery {
        InlineQuery {
            model: self.prompt_model.clone(),
            view: view.name().to_string(),
            fields: vec![view.output_field()],
            filters,
            limit: None,
            sorts: Vec::new(),
        }
    }

    pub fn chat(&self, history: &Conversation, input: &str, explore: Option<&ExploreRef>) -> InlineQuery {
        let view = PromptView::Chat;
        let mut filters = BTreeMap::new();
        filters.insert(
            format!("{}.previous_messages", view.name()),
            format!("'{}'", history.single_line_history()),
        );
        filters.insert(format!("{}.prompt_input", view.name()), input.replace(',', ""));
        if let Some(e) = explore {
            filters.insert(format!("{}.model", view.name()), format!("'{}'", e.model));
            filters.insert(format!("{}.explore", view.name()), format!("'{}'", e.explore));
        }
        self.query(view, filters)
    }

    pub fn summary(&self, history: &Conversation, rows_json: &str) -> InlineQuery {
        let view = PromptView::Summary;
        let mut filters = BTreeMap::new();
        filters.insert(
            format!("{}.previous_messages", view.name()),
            format!("'{}'", history.single_line_history()),
        );
        filters.insert(format!("{}.prompt_input", view.name()), summary_input(rows_json));
        self.query(view, filters)
    }
}

/// Read `<view>.generated_content` from the first response row.
pub fn generated_content(response: &Value, view: PromptView) -> Result<String> {
    let field = view.output_field();
    response
        .get(0)
        .and_then(|row| row.get(&field))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShapeError::upstream(format!("{} returned no {field}", view.name())))
}
