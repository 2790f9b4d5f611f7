//! 病人档案服务
//!
//! 档案的增删改查与随机生成。删除病人时一并丢弃其对话。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::persona::Persona;
use crate::services::generator::PersonaGenerator;
use crate::storage::conversation_store::ConversationStore;
use crate::storage::repository::Repository;

/// 列表查询的上限
const LIST_LIMIT: usize = 1000;

#[async_trait]
pub trait PersonaService: Send + Sync {
    async fn list(&self) -> Result<Vec<Persona>>;

    async fn get(&self, id: &str) -> Result<Persona>;

    /// 创建病人，未提供 ID 时自动生成
    async fn create(&self, persona: Persona) -> Result<Persona>;

    /// 整体替换，ID 以路径为准
    async fn update(&self, id: &str, persona: Persona) -> Result<Persona>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// 随机生成一个病人并保存
    async fn generate(&self) -> Result<Persona>;
}

pub struct PersonaServiceImpl {
    repository: Arc<dyn Repository<Persona>>,
    conversations: Arc<ConversationStore>,
    generator: PersonaGenerator,
}

impl PersonaServiceImpl {
    pub fn new(
        repository: Arc<dyn Repository<Persona>>,
        conversations: Arc<ConversationStore>,
        generator: PersonaGenerator,
    ) -> Self {
        Self {
            repository,
            conversations,
            generator,
        }
    }
}

#[async_trait]
impl PersonaService for PersonaServiceImpl {
    async fn list(&self) -> Result<Vec<Persona>> {
        self.repository.list(LIST_LIMIT, 0).await
    }

    async fn get(&self, id: &str) -> Result<Persona> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("persona '{}' not found", id)))
    }

    async fn create(&self, mut persona: Persona) -> Result<Persona> {
        persona.validate().map_err(AppError::Validation)?;
        if persona.id.trim().is_empty() {
            persona.id = Uuid::now_v7().to_string();
        }
        let created = self.repository.create(&persona).await?;
        info!(persona_id = %created.id, condition = %created.condition, "Persona created");
        Ok(created)
    }

    async fn update(&self, id: &str, persona: Persona) -> Result<Persona> {
        persona.validate().map_err(AppError::Validation)?;
        let updated = self
            .repository
            .update(id, &persona)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("persona '{}' not found", id)))?;
        info!(persona_id = %id, "Persona updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound(format!("persona '{}' not found", id)));
        }
        self.conversations.remove(id);
        info!(persona_id = %id, "Persona deleted");
        Ok(())
    }

    async fn generate(&self) -> Result<Persona> {
        let templates = self.repository.list(LIST_LIMIT, 0).await?;
        let persona = self.generator.generate(&templates)?;
        self.create(persona).await
    }
}

pub fn create_persona_service(
    repository: Arc<dyn Repository<Persona>>,
    conversations: Arc<ConversationStore>,
    generator: PersonaGenerator,
) -> Box<dyn PersonaService> {
    Box::new(PersonaServiceImpl::new(repository, conversations, generator))
}
