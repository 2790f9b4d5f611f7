//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。
//! 对话相关的请求与响应直接使用服务层的 `ChatTurnRequest` / `ChatTurnResult` / `ConversationSnapshot`。

pub mod persona_dto;
pub mod search_dto;
pub mod upload_dto;

pub use persona_dto::*;
pub use search_dto::*;
pub use upload_dto::*;
