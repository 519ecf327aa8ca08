//! One conversational turn: question -> prompt -> query spec -> result -> shape.
//!
//! Each upstream call runs under a deadline. Failures never escape [`ChatSession::ask`];
//! they become a bot message and the conversation continues.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ShaperConfig;
use crate::data::QueryResult;
use crate::error::{Result, ShapeError};
use crate::ir::{ShapeRequest, ShapedResult};
use crate::prompt::{clean_user_input, generated_content, Conversation, ExploreRef, PromptRequest, PromptView};
use crate::query::{parse_query_spec, InlineQuery};
use crate::shape::shape;

/// The query service that runs inline queries, prompt views included.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LookerClient: Send + Sync {
    async fn run_inline_query(&self, body: &InlineQuery) -> Result<Value>;
}

/// Run `fut`, failing with [`ShapeError::Timeout`] once `limit` elapses.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ShapeError::Timeout(limit))?
}

/// Outcome of one turn.
#[derive(Debug, Clone)]
pub enum Reply {
    /// The question produced a result. `summary` is set for results that
    /// can only be summarised in text.
    Shaped {
        result: QueryResult,
        request: ShapeRequest,
        shaped: ShapedResult,
        summary: Option<String>,
    },
    /// The turn failed; the message was also appended to the conversation.
    Error { category: &'static str, message: String },
    /// Nothing left to ask after cleaning the input.
    Ignored,
}

pub struct ChatSession<C> {
    client: C,
    prompts: PromptRequest,
    explore: Option<ExploreRef>,
    prompt_timeout: Duration,
    query_timeout: Duration,
}

impl<C: LookerClient> ChatSession<C> {
    pub fn new(client: C, config: &ShaperConfig) -> Self {
        Self {
            client,
            prompts: PromptRequest::new(config.prompt_model.clone()),
            explore: None,
            prompt_timeout: config.prompt_timeout(),
            query_timeout: config.query_timeout(),
        }
    }

    pub fn with_explore(mut self, explore: ExploreRef) -> Self {
        self.explore = Some(explore);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Ask one question against the conversation owned by the caller.
    pub async fn ask(&self, conversation: &mut Conversation, question: &str) -> Reply {
        let input = clean_user_input(question);
        if input.is_empty() {
            return Reply::Ignored;
        }
        conversation.push_user(input.clone());

        match self.run_turn(conversation, &input).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{}: {}", e.category(), e);
                let message = e.user_message();
                conversation.push_bot(message.clone());
                Reply::Error {
                    category: e.category(),
                    message,
                }
            }
        }
    }

    async fn run_turn(&self, conversation: &mut Conversation, input: &str) -> Result<Reply> {
        let prompt = self.prompts.chat(conversation, input, self.explore.as_ref());
        let response = with_deadline(self.prompt_timeout, self.client.run_inline_query(&prompt)).await?;
        let content = generated_content(&response, PromptView::Chat)?;
        debug!(%content, "chat prompt answered");

        let query = parse_query_spec(&content)?.validate()?;
        info!(model = %query.model, view = %query.view, fields = query.fields.len(), "running generated query");

        let raw = with_deadline(
            self.query_timeout,
            self.client.run_inline_query(&query.to_inline_query()),
        )
        .await?;
        let result = QueryResult::from_json(&raw)?;
        let request = ShapeRequest::default_for(&result);
        let shaped = shape(&result, &request)?;

        let summary = match &shaped {
            ShapedResult::Summary { text } => match self.summarise(conversation, text).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("summary failed: {e}");
                    conversation.push_bot("Error generating summary. Please try again.");
                    None
                }
            },
            _ => None,
        };

        conversation.push_bot(match &summary {
            Some(text) => text.clone(),
            None => format!(
                "Showing {} of {} rows from {}.{}",
                shaped.kind(),
                result.rows.len(),
                query.model,
                query.view
            ),
        });

        Ok(Reply::Shaped {
            result,
            request,
            shaped,
            summary,
        })
    }

    async fn summarise(&self, conversation: &Conversation, rows_json: &str) -> Result<String> {
        let prompt = self.prompts.summary(conversation, rows_json);
        let response = with_deadline(self.prompt_timeout, self.client.run_inline_query(&prompt)).await?;
        let text = generated_content(&response, PromptView::Summary)?;
        Ok(clean_user_input(&text.replace(',', "")))
    }
}
