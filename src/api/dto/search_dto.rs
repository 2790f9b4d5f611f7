//! 知识检索 DTO

use serde::{Deserialize, Serialize};

use crate::models::knowledge::KnowledgeSnippet;

/// 单次检索的结果上限
pub const MAX_SEARCH_LIMIT: usize = 20;

/// 检索查询参数
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeSearchParams {
    /// 病症名称
    pub condition: String,
    /// 检索文本
    pub query: String,
    /// 返回数量，缺省取配置值
    pub limit: Option<usize>,
}

/// 检索响应
#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeSearchResponse {
    pub condition: String,
    pub query: String,
    pub results: Vec<KnowledgeSnippet>,
    pub total: usize,
}
