mod client;
mod types;

pub use client::{ApiClient, FilePayload};
pub use types::{
    ChatMessage, ChatTurnResponse, Delivery, ImportResponse, MessageRole, Provider, Session,
    SessionSummary, SessionsResponse, TokenUsage,
};
