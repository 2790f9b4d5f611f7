//! 数据模型模块
//!
//! 定义病人档案、对话消息、知识条目和上传状态。

pub mod conversation;
pub mod knowledge;
pub mod message;
pub mod persona;
pub mod upload;

pub use conversation::{Conversation, MessageRemoval};
pub use knowledge::{KnowledgeEntry, KnowledgeSnippet};
pub use message::{Message, Sender, Sentiment, TriggerClassification, TriggerType};
pub use persona::{DEFAULT_CATEGORY, Language, Persona, ResponseBank};
pub use upload::{BookFormat, BookStatus, UploadStatus, UploadStatusEntry};
