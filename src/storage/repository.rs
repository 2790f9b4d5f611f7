use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::persona::Persona;

/// 内置病人目录
const BUILTIN_CATALOG: &str = include_str!("../../data/personas.json");

/// 仓储 trait
#[async_trait]
pub trait Repository<T: Clone + Send + Sync>: Send + Sync {
    /// 创建实体
    async fn create(&self, entity: &T) -> Result<T>;

    /// 根据 ID 获取实体
    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// 更新实体
    async fn update(&self, id: &str, entity: &T) -> Result<Option<T>>;

    /// 删除实体
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 列出所有实体
    async fn list(&self, limit: usize, start: usize) -> Result<Vec<T>>;

    /// 统计数量
    async fn count(&self) -> Result<u64>;
}

/// 内存中的病人仓储
///
/// 保持插入顺序，进程重启后恢复为目录内容。
pub struct InMemoryPersonaRepository {
    personas: RwLock<Vec<Persona>>,
}

impl InMemoryPersonaRepository {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self {
            personas: RwLock::new(personas),
        }
    }

    /// 从 JSON 文本加载目录，逐条校验
    pub fn from_json(json: &str) -> Result<Self> {
        let personas: Vec<Persona> = serde_json::from_str(json)?;
        let mut seen = std::collections::HashSet::new();
        for persona in &personas {
            if persona.id.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "persona '{}' in catalog has no id",
                    persona.name
                )));
            }
            if !seen.insert(persona.id.clone()) {
                return Err(AppError::Config(format!(
                    "duplicate persona id '{}' in catalog",
                    persona.id
                )));
            }
            persona
                .validate()
                .map_err(|e| AppError::Config(format!("persona '{}': {}", persona.id, e)))?;
        }
        Ok(Self::new(personas))
    }

    /// 内置的三个病人
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// 从文件加载目录
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl Repository<Persona> for InMemoryPersonaRepository {
    async fn create(&self, persona: &Persona) -> Result<Persona> {
        let mut personas = self.personas.write();
        if personas.iter().any(|p| p.id == persona.id) {
            return Err(AppError::Conflict(format!(
                "persona '{}' already exists",
                persona.id
            )));
        }
        personas.push(persona.clone());
        Ok(persona.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Persona>> {
        Ok(self.personas.read().iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: &str, persona: &Persona) -> Result<Option<Persona>> {
        let mut personas = self.personas.write();
        match personas.iter_mut().find(|p| p.id == id) {
            Some(existing) => {
                *existing = persona.clone();
                existing.id = id.to_string();
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut personas = self.personas.write();
        let before = personas.len();
        personas.retain(|p| p.id != id);
        Ok(personas.len() != before)
    }

    async fn list(&self, limit: usize, start: usize) -> Result<Vec<Persona>> {
        Ok(self
            .personas
            .read()
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.personas.read().len() as u64)
    }
}
