//! Mock generator for testing question answering.
//!
//! Allows defining canned answers for specific questions, enabling
//! end-to-end testing of the retrieval pipeline without real API calls.

use async_trait::async_trait;
use quarry_core::{AnswerGenerator, Error, IgnoreLock as _, Result};
use std::sync::{Arc, Mutex};

/// One recorded `generate_answer` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Context passed to the generator
    pub context: String,
    /// Question passed to the generator
    pub question: String,
}

/// Scripted reply for a question pattern.
#[derive(Debug, Clone)]
enum Reply {
    /// Return this answer
    Answer(String),
    /// Fail with this provider error
    Failure(String),
}

/// Mock generator that returns pre-defined answers based on question patterns.
#[derive(Clone, Default)]
pub struct MockGenerator {
    /// Scripted replies in registration order, keyed by question substring
    replies: Arc<Mutex<Vec<(String, Reply)>>>,
    /// Reply when no pattern matches
    default_reply: Arc<Mutex<Option<Reply>>>,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGenerator {
    /// Create a mock generator with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer questions containing `pattern` with `answer`.
    #[must_use]
    pub fn with_answer(self, pattern: impl Into<String>, answer: impl Into<String>) -> Self {
        self.replies
            .lock_ignore_poison()
            .push((pattern.into(), Reply::Answer(answer.into())));
        self
    }

    /// Fail questions containing `pattern` with a provider error.
    #[must_use]
    pub fn with_failure(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies
            .lock_ignore_poison()
            .push((pattern.into(), Reply::Failure(message.into())));
        self
    }

    /// Set the answer for questions that match no pattern.
    #[must_use]
    pub fn with_default_answer(self, answer: impl Into<String>) -> Self {
        *self.default_reply.lock_ignore_poison() = Some(Reply::Answer(answer.into()));
        self
    }

    /// Fail every question that matches no pattern.
    #[must_use]
    pub fn failing(self, message: impl Into<String>) -> Self {
        *self.default_reply.lock_ignore_poison() = Some(Reply::Failure(message.into()));
        self
    }

    /// Get the call history.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_history.lock_ignore_poison().clone()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock_ignore_poison().len()
    }

    /// Clear the call history.
    pub fn clear_history(&self) {
        self.call_history.lock_ignore_poison().clear();
    }

    /// First scripted reply whose pattern occurs in `question`.
    fn find_reply(&self, question: &str) -> Option<Reply> {
        self.replies
            .lock_ignore_poison()
            .iter()
            .find(|(pattern, _)| question.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
    }
}

#[async_trait]
impl AnswerGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        self.call_history.lock_ignore_poison().push(MockCall {
            context: context.to_owned(),
            question: question.to_owned(),
        });

        let reply = self
            .find_reply(question)
            .or_else(|| self.default_reply.lock_ignore_poison().clone());

        match reply {
            Some(Reply::Answer(answer)) => Ok(answer),
            Some(Reply::Failure(message)) => Err(Error::Provider(message)),
            None => Ok(format!("Mock answer for question: {question}")),
        }
    }
}
