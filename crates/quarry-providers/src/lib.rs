//! Answer generator adapters for external LLM services.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Test allows"
    )
)]

/// Gemini `generateContent` generator.
pub mod gemini;
/// Scripted generator for tests.
pub mod mock;

pub use gemini::GeminiGenerator;
pub use mock::MockGenerator;
