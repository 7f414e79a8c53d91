pub mod conversation;
pub mod fragment;
pub mod user;

pub use conversation::{ChatMessage, ConversationSession, MessageKind, Role};
pub use fragment::OcrFragment;
pub use user::{Medicine, MedicineRecord, UserProfile};
