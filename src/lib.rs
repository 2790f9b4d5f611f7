//! vpatient - 虚拟病人对话训练服务
//!
//! 心理咨询学员用英语或西班牙语与模拟病人对话。病人档案决定病症、症状、
//! 触发点与治疗陷阱；不专业或触发性的发言会累积不适，超过阈值后病人离开会话。
//! 上传的 PDF/EPUB 参考书被分块写入知识库，检索结果用于丰富补全提示词。

pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
