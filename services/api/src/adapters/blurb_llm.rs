//! services/api/src/adapters/blurb_llm.rs
//!
//! This module contains the adapter for the recommendation-text service.
//! It implements the `BlurbService` port from the `core` crate.

use std::collections::HashMap;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use wayfarer_core::ports::{BlurbService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `BlurbService` using an OpenAI-compatible LLM.
///
/// Blurbs are cached per place name: the wording is non-deterministic, so a
/// repeat request for the same place must not produce a second, different
/// comment mid-session (and repeat calls cost nothing).
pub struct OpenAiBlurbAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
    cache: RwLock<HashMap<String, String>>,
}

impl OpenAiBlurbAdapter {
    /// Creates a new `OpenAiBlurbAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn generate(&self, place_name: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a recommendation assistant for users who love exploring their city on foot.")
                .build()
                .map_err(|e| PortError::TextServiceUnavailable(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Write a short comment, at most 100 characters, that makes the reader want to visit \"{}\".",
                    place_name
                ))
                .build()
                .map_err(|e| PortError::TextServiceUnavailable(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.8)
            .max_tokens(120u32)
            .n(1)
            .build()
            .map_err(|e| PortError::TextServiceUnavailable(e.to_string()))?;

        // A hung text service must never block candidate display.
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                PortError::TextServiceUnavailable(format!(
                    "blurb generation timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e: OpenAIError| PortError::TextServiceUnavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        match content {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(PortError::TextServiceUnavailable(
                "blurb LLM response contained no text content".to_string(),
            )),
        }
    }
}

//=========================================================================================
// `BlurbService` Trait Implementation
//=========================================================================================

#[async_trait]
impl BlurbService for OpenAiBlurbAdapter {
    async fn blurb_for(&self, place_name: &str) -> PortResult<String> {
        if let Some(cached) = self.cache.read().await.get(place_name) {
            debug!(place = %place_name, "blurb cache hit");
            return Ok(cached.clone());
        }

        let blurb = self.generate(place_name).await?;
        self.cache
            .write()
            .await
            .insert(place_name.to_string(), blurb.clone());
        Ok(blurb)
    }
}

/// A fallback blurb service used when no API key is configured: every place
/// gets the same generic comment and candidate display never waits on a
/// network call.
pub struct NullBlurbs;

#[async_trait]
impl BlurbService for NullBlurbs {
    async fn blurb_for(&self, _place_name: &str) -> PortResult<String> {
        Ok("A spot worth wandering to.".to_string())
    }
}
