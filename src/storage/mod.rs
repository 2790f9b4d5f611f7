//! 存储层模块
//!
//! 病人仓储、对话存储和上传状态表，全部驻留内存。

pub mod conversation_store;
pub mod factory;
pub mod repository;
pub mod upload_status;

pub use conversation_store::ConversationStore;
pub use factory::create_persona_repository;
pub use repository::{InMemoryPersonaRepository, Repository};
pub use upload_status::UploadStatusStore;
