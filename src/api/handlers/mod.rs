//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod chat_handler;
pub mod knowledge_handler;
pub mod persona_handler;
pub mod upload_handler;

pub use chat_handler::*;
pub use knowledge_handler::*;
pub use persona_handler::*;
pub use upload_handler::*;
