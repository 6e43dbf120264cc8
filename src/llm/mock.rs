//! Mock LLM client for testing.
//!
//! Deterministic stand-in for both round trips: SQL generation and answer
//! synthesis. The phase is detected from the prompt itself, so the mock
//! plugs into the engine unchanged.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Result, SageError};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Marker present only in synthesis prompts.
const SYNTHESIS_MARKER: &str = "Query result:";

/// Mock LLM client that returns canned responses.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Pattern on the question text -> canned generation response.
    sql_responses: Vec<(String, String)>,
    /// Fixed synthesis answer; a generic one applies when unset.
    answer: Option<String>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    /// Last user message of every request, in call order.
    requests: Mutex<Vec<String>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `response` from the generation phase when the question
    /// contains `pattern`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.sql_responses.push((pattern.into(), response.into()));
        self
    }

    /// Sets the synthesis-phase answer.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Makes every call fail with the given message.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Last user message of every request so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn last_user_message(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    fn generation_response(&self, question: &str) -> String {
        let question_lower = question.to_lowercase();
        for (pattern, response) in &self.sql_responses {
            if question_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }
        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    fn synthesis_response(&self) -> String {
        self.answer
            .clone()
            .unwrap_or_else(|| "Based on the query results, here is what I found.".to_string())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::last_user_message(messages);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(input.clone());
        }

        if let Some(message) = &self.failure {
            return Err(SageError::llm(message.clone()));
        }

        if input.contains(SYNTHESIS_MARKER) {
            Ok(self.synthesis_response())
        } else {
            Ok(self.generation_response(&input))
        }
    }
}
