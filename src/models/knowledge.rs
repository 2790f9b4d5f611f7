use serde::{Deserialize, Serialize};

/// 知识条目
///
/// 从上传的书籍中切分得到，写入后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    /// 文本片段
    pub text: String,
    /// 来源（书名）
    pub source: String,
    /// 页码（近似，按分块序号）
    pub page: u32,
    /// 章节标签
    pub chapter: String,
    /// 病症标签，多个时以 ", " 分隔
    pub condition: String,
    /// 标签集合
    pub tags: Vec<String>,
}

impl KnowledgeEntry {
    /// 条目是否与指定病症相关
    ///
    /// 任一病症标签与查询病症互相包含（忽略大小写）即视为匹配，
    /// 例如 "Anxiety" 同时匹配 "Anxiety Disorder" 和 "Social Anxiety"。
    pub fn matches_condition(&self, condition: &str) -> bool {
        let wanted = condition.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        self.condition
            .split(',')
            .map(|label| label.trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .any(|label| wanted.contains(&label) || label.contains(&wanted))
    }
}

/// 检索结果片段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSnippet {
    pub text: String,
    pub source: String,
    pub chapter: String,
    /// 相似度分数
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(condition: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            text: "text".into(),
            source: "book".into(),
            page: 1,
            chapter: "Chapter 1".into(),
            condition: condition.into(),
            tags: vec![],
        }
    }

    #[test]
    fn test_condition_matching() {
        let anxiety = entry("Anxiety");
        assert!(anxiety.matches_condition("Anxiety Disorder"));
        assert!(anxiety.matches_condition("social anxiety"));
        assert!(!anxiety.matches_condition("Depression"));

        let multi = entry("Depression, PTSD");
        assert!(multi.matches_condition("PTSD"));
        assert!(multi.matches_condition("Depression"));
    }

    #[test]
    fn test_untagged_entry_never_matches() {
        assert!(!entry("").matches_condition("Depression"));
        assert!(!entry("Depression").matches_condition("  "));
    }
}
