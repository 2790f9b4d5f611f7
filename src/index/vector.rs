//! 向量索引服务

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::knowledge::KnowledgeEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub id: String,
    pub score: f32,
    pub entry: KnowledgeEntry,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(&self, id: &str, vector: &[f32], entry: KnowledgeEntry) -> Result<()>;
    /// 只在病症匹配的条目中按相似度降序检索
    async fn search(
        &self,
        query: &[f32],
        condition: &str,
        limit: usize,
    ) -> Result<Vec<VectorSearchResult>>;
    async fn count(&self) -> Result<usize>;
}

pub struct MemoryVectorIndex {
    vectors: DashMap<String, (Vec<f32>, KnowledgeEntry)>,
    dimension: usize,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: DashMap::new(),
            dimension,
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(AppError::VectorIndex(format!(
                "expected dimension {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn add(&self, id: &str, vector: &[f32], entry: KnowledgeEntry) -> Result<()> {
        self.check_dimension(vector)?;
        self.vectors.insert(id.to_string(), (vector.to_vec(), entry));
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        condition: &str,
        limit: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        self.check_dimension(query)?;

        let mut results: Vec<_> = self
            .vectors
            .iter()
            .filter(|ref_multi| ref_multi.value().1.matches_condition(condition))
            .map(|ref_multi| {
                let (id, (vector, entry)) = ref_multi.pair();
                VectorSearchResult {
                    id: id.clone(),
                    score: Self::cosine_similarity(query, vector),
                    entry: entry.clone(),
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.vectors.len())
    }
}

pub fn create_vector_index(dimension: usize) -> Box<dyn VectorIndex> {
    Box::new(MemoryVectorIndex::new(dimension))
}
