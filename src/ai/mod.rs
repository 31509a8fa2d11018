//! All AI/LLM functionality

pub mod client;
pub mod request;

// Re-export main types for convenience
pub use client::{HttpTransport, RawResponse, SiliconFlowClient, Transport};
pub use request::{ChatMessage, ChatRequest, build_request};
