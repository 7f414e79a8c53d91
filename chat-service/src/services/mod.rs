pub mod chat;
pub mod context_cache;
pub mod database;
pub mod grounding;
pub mod ocr;
pub mod providers;
pub mod session_store;
pub mod uploads;

pub use chat::ChatService;
pub use context_cache::ContextCache;
pub use database::ChatDb;
pub use session_store::{InMemorySessionStore, RedisSessionStore, SessionStore};
pub use uploads::UploadStore;
