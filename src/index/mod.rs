//! 索引模块
//!
//! 知识库 = 嵌入模型 + 向量索引。检索按病症过滤，再按相似度排序。

pub mod embedding;
pub mod vector;

pub use embedding::{EmbeddingModel, create_embedding_model};
pub use vector::{VectorIndex, VectorSearchResult, create_vector_index};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::config::EmbeddingConfig;
use crate::error::Result;
use crate::models::knowledge::{KnowledgeEntry, KnowledgeSnippet};

/// 批量写入时每批的条目数
pub const ADD_BATCH_SIZE: usize = 100;

/// 知识检索接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// 按病症和自由文本检索，结果按相关度降序
    async fn query(&self, condition: &str, query: &str, limit: usize)
    -> Result<Vec<KnowledgeSnippet>>;

    /// 批量写入条目，返回写入数量
    async fn add_entries(&self, entries: Vec<KnowledgeEntry>) -> Result<usize>;

    /// 条目总数
    async fn count(&self) -> Result<usize>;
}

pub struct VectorKnowledgeBase {
    vector_index: Box<dyn VectorIndex>,
    embedding_model: Box<dyn EmbeddingModel>,
}

impl VectorKnowledgeBase {
    pub fn new(vector_index: Box<dyn VectorIndex>, embedding_model: Box<dyn EmbeddingModel>) -> Self {
        Self {
            vector_index,
            embedding_model,
        }
    }
}

#[async_trait]
impl KnowledgeRetriever for VectorKnowledgeBase {
    async fn query(
        &self,
        condition: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        // 没有查询文本时以病症名作为查询
        let text = if query.trim().is_empty() { condition } else { query };
        let embedding = self.embedding_model.encode(text).await?;
        let results = self.vector_index.search(&embedding, condition, limit).await?;

        debug!(condition, hits = results.len(), "Knowledge query finished");

        Ok(results
            .into_iter()
            .map(|r| KnowledgeSnippet {
                text: r.entry.text,
                source: r.entry.source,
                chapter: r.entry.chapter,
                score: r.score,
            })
            .collect())
    }

    async fn add_entries(&self, entries: Vec<KnowledgeEntry>) -> Result<usize> {
        let mut added = 0;
        for batch in entries.chunks(ADD_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|e| e.text.as_str()).collect();
            let embeddings = self.embedding_model.encode_batch(&texts).await?;
            for (entry, embedding) in batch.iter().zip(embeddings.iter()) {
                let id = Uuid::now_v7().to_string();
                self.vector_index.add(&id, embedding, entry.clone()).await?;
                added += 1;
            }
            debug!(batch = batch.len(), total = added, "Knowledge batch added");
        }
        info!(added, "Knowledge entries added");
        Ok(added)
    }

    async fn count(&self) -> Result<usize> {
        self.vector_index.count().await
    }
}

pub fn create_knowledge_base(config: &EmbeddingConfig) -> Result<Box<dyn KnowledgeRetriever>> {
    let embedding_model = create_embedding_model(config)?;
    let vector_index = create_vector_index(embedding_model.dimension());
    Ok(Box::new(VectorKnowledgeBase::new(vector_index, embedding_model)))
}
