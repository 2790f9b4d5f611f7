use std::sync::Arc;
use std::time::Duration;

use crate::config::config::AppConfig;
use crate::error::Result;
use crate::index::{KnowledgeRetriever, create_knowledge_base};
use crate::models::persona::Persona;
use crate::observability::AppMetrics;
use crate::services::chat::{ChatService, ChatServiceImpl, ChatSettings};
use crate::services::completion::{CompletionGateway, create_completion_gateway};
use crate::services::generator::PersonaGenerator;
use crate::services::ingestion::{IngestionService, create_ingestion_service};
use crate::services::persona::{PersonaService, create_persona_service};
use crate::services::picker::{ResponsePicker, SeededPicker};
use crate::services::trigger::TriggerDetector;
use crate::storage::{
    ConversationStore, Repository, UploadStatusStore, create_persona_repository,
};

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Persona CRUD and generation
    pub persona_service: Arc<dyn PersonaService>,
    /// Chat turns and conversation management
    pub chat_service: Arc<dyn ChatService>,
    /// Book upload and ingestion
    pub ingestion_service: Arc<dyn IngestionService>,
    /// Knowledge base shared by chat and ingestion
    pub knowledge: Arc<dyn KnowledgeRetriever>,
    pub metrics: Arc<AppMetrics>,
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("persona_service", &"Arc<dyn PersonaService>")
            .field("chat_service", &"Arc<dyn ChatService>")
            .field("ingestion_service", &"Arc<dyn IngestionService>")
            .field("knowledge", &"Arc<dyn KnowledgeRetriever>")
            .field("config", &self.config.app_name)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        persona_service: Box<dyn PersonaService>,
        chat_service: Box<dyn ChatService>,
        ingestion_service: Box<dyn IngestionService>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        metrics: Arc<AppMetrics>,
        config: AppConfig,
    ) -> Self {
        Self {
            persona_service: Arc::from(persona_service),
            chat_service: Arc::from(chat_service),
            ingestion_service: Arc::from(ingestion_service),
            knowledge,
            metrics,
            config: Arc::new(config),
        }
    }

    /// 按配置组装全部服务
    pub fn from_config(config: AppConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let personas: Arc<dyn Repository<Persona>> =
            Arc::from(create_persona_repository(&config.personas)?);
        let conversations = Arc::new(ConversationStore::new());
        let knowledge: Arc<dyn KnowledgeRetriever> =
            Arc::from(create_knowledge_base(&config.embedding)?);
        let gateway: Option<Arc<dyn CompletionGateway>> =
            create_completion_gateway(&config.completion)?.map(Arc::from);
        if gateway.is_none() {
            tracing::warn!("No completion API configured, patient replies come from response banks");
        }

        let picker: Arc<dyn ResponsePicker> = match config.personas.rng_seed {
            Some(seed) => Arc::new(SeededPicker::from_seed(seed)),
            None => Arc::new(SeededPicker::from_entropy()),
        };

        let persona_service = create_persona_service(
            personas.clone(),
            conversations.clone(),
            PersonaGenerator::new(picker.clone()),
        );

        let chat_service = ChatServiceImpl::new(
            personas,
            conversations,
            knowledge.clone(),
            picker,
            metrics.clone(),
        )
        .with_gateway(gateway)
        .with_detector(TriggerDetector::with_builtin_profiles())
        .with_settings(ChatSettings {
            result_limit: config.knowledge.result_limit,
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
        });

        let statuses = Arc::new(UploadStatusStore::new(Duration::from_secs(
            config.knowledge.status_ttl_secs,
        )));
        let ingestion_service = create_ingestion_service(
            config.knowledge.books_dir.clone(),
            config.knowledge.min_chunk_chars,
            statuses,
            knowledge.clone(),
            metrics.clone(),
        );

        Ok(Self::new(
            persona_service,
            Box::new(chat_service),
            ingestion_service,
            knowledge,
            metrics,
            config,
        ))
    }
}
