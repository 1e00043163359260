mod models;
mod schema;

pub use models::{
    new_knowledge_id, new_session_tag, now_rfc3339, Category, ChatMessage, ChatRole, Knowledge,
    CHATTING_TIME_SECS, READING_TIME_SECS,
};
pub use schema::{Database, StoreError, StoreResult};
