//! 对话服务
//!
//! 一轮对话：触发检测 → 命中时由状态机决定反应或离开；
//! 未命中时检索知识、拼提示词、调用补全（离线模式改用回复库）。
//! 同一病人的对话全程持锁，补全请求同一时间最多一个。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::index::KnowledgeRetriever;
use crate::models::conversation::{Conversation, MessageRemoval};
use crate::models::knowledge::KnowledgeSnippet;
use crate::models::message::{Message, Sentiment};
use crate::models::persona::{Language, Persona};
use crate::observability::AppMetrics;
use crate::services::completion::{ChatMessage, CompletionGateway, CompletionRequest};
use crate::services::escalation::EscalationState;
use crate::services::picker::ResponsePicker;
use crate::services::prompt;
use crate::services::reactions::{fallback_reply, react};
use crate::services::responder::offline_reply;
use crate::services::trigger::TriggerDetector;
use crate::storage::conversation_store::ConversationStore;
use crate::storage::repository::Repository;

/// 单条消息的最大字符数
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// 一轮对话的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    pub text: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// 一轮对话的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnResult {
    pub user_message: Message,
    pub reply: Message,
    pub state: EscalationState,
    pub discomfort: f64,
    pub has_patient_left: bool,
}

/// 对话快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub persona_id: String,
    pub messages: Vec<Message>,
    pub state: EscalationState,
    pub discomfort: f64,
    pub has_patient_left: bool,
    pub started_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSnapshot {
    fn from(conversation: &Conversation) -> Self {
        Self {
            persona_id: conversation.persona_id.clone(),
            messages: conversation.messages().to_vec(),
            state: conversation.state(),
            discomfort: conversation.escalation().discomfort(),
            has_patient_left: conversation.has_patient_left(),
            started_at: conversation.started_at,
        }
    }
}

/// 补全参数
#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    /// 检索片段数量
    pub result_limit: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            result_limit: 3,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// 发送一条消息并得到病人回复
    async fn send(&self, persona_id: &str, request: ChatTurnRequest) -> Result<ChatTurnResult>;

    async fn conversation(&self, persona_id: &str) -> Result<ConversationSnapshot>;

    /// 删除一条消息；删除离开消息会恢复会话
    async fn delete_message(&self, persona_id: &str, message_id: &str)
    -> Result<ConversationSnapshot>;

    /// 清空对话
    async fn reset(&self, persona_id: &str) -> Result<ConversationSnapshot>;
}

pub struct ChatServiceImpl {
    personas: Arc<dyn Repository<Persona>>,
    conversations: Arc<ConversationStore>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    gateway: Option<Arc<dyn CompletionGateway>>,
    detector: TriggerDetector,
    picker: Arc<dyn ResponsePicker>,
    metrics: Arc<AppMetrics>,
    settings: ChatSettings,
}

impl ChatServiceImpl {
    pub fn new(
        personas: Arc<dyn Repository<Persona>>,
        conversations: Arc<ConversationStore>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        picker: Arc<dyn ResponsePicker>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            personas,
            conversations,
            knowledge,
            gateway: None,
            detector: TriggerDetector::default(),
            picker,
            metrics,
            settings: ChatSettings::default(),
        }
    }

    /// 设置补全网关；不设置时使用离线回复
    pub fn with_gateway(mut self, gateway: Option<Arc<dyn CompletionGateway>>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_detector(mut self, detector: TriggerDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    async fn persona(&self, persona_id: &str) -> Result<Persona> {
        self.personas
            .get_by_id(persona_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("persona '{}' not found", persona_id)))
    }

    /// 检索失败时返回空列表，不影响本轮对话
    async fn retrieve(&self, persona: &Persona, query: &str) -> Vec<KnowledgeSnippet> {
        match self
            .knowledge
            .query(&persona.condition, query, self.settings.result_limit)
            .await
        {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(persona_id = %persona.id, error = %e, "Knowledge retrieval failed, continuing without context");
                self.metrics.record_retrieval_failure();
                Vec::new()
            }
        }
    }

    /// 生成病人的正常回复；补全失败时使用兜底回复，不重试
    async fn generate_reply(
        &self,
        persona: &Persona,
        conversation: &Conversation,
        request: &ChatTurnRequest,
    ) -> String {
        let Some(gateway) = &self.gateway else {
            return offline_reply(persona, &request.text, request.language, self.picker.as_ref())
                .unwrap_or_else(|| fallback_reply(request.language).to_string());
        };

        let knowledge = self.retrieve(persona, &request.text).await;
        let system_prompt = prompt::compose(
            persona,
            request.language,
            &knowledge,
            request.custom_prompt.as_deref(),
        );
        let history: Vec<ChatMessage> = conversation
            .messages()
            .iter()
            .map(ChatMessage::from)
            .collect();
        let completion = CompletionRequest::new(system_prompt, history)
            .with_sampling(self.settings.temperature, self.settings.max_tokens);

        match gateway.complete(&completion).await {
            Ok(text) => text,
            Err(e) => {
                warn!(persona_id = %persona.id, error = %e, "Completion failed, using fallback reply");
                self.metrics.record_completion_failure();
                fallback_reply(request.language).to_string()
            }
        }
    }

    fn validate_request(request: &ChatTurnRequest) -> Result<()> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("message text cannot be empty".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "message text exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn send(&self, persona_id: &str, request: ChatTurnRequest) -> Result<ChatTurnResult> {
        Self::validate_request(&request)?;
        let persona = self.persona(persona_id).await?;

        let handle = self.conversations.handle(persona_id);
        let mut conversation = handle.lock().await;

        if conversation.has_patient_left() {
            return Err(AppError::Conflict(format!(
                "{} has left the session; delete the leaving message or reset the conversation",
                persona.name
            )));
        }

        let classification = self.detector.detect(&request.text, &persona);
        let user_message = Message::user(&request.text, classification);
        conversation.push(user_message.clone());
        self.metrics.record_turn();

        let reply = match classification.trigger_type.filter(|_| classification.is_negative) {
            Some(trigger_type) => {
                let outcome = conversation
                    .escalation_mut()
                    .register(classification.severity);
                let reaction = react(trigger_type, &outcome, request.language, self.picker.as_ref());
                self.metrics.record_trigger(trigger_type);

                info!(
                    persona_id,
                    trigger = %trigger_type,
                    severity = classification.severity,
                    discomfort = outcome.discomfort,
                    patient_leaves = outcome.patient_leaves,
                    "Negative trigger detected"
                );

                let mut reply = Message::patient(&reaction.text).with_sentiment(reaction.sentiment);
                if reaction.is_patient_leaving {
                    self.metrics.record_session_ended();
                    reply = reply.leaving();
                }
                reply
            }
            None => {
                let text = self
                    .generate_reply(&persona, &conversation, &request)
                    .await;
                Message::patient(&text).with_sentiment(Sentiment::Neutral)
            }
        };

        conversation.push(reply.clone());
        debug!(persona_id, messages = conversation.messages().len(), "Turn finished");

        Ok(ChatTurnResult {
            user_message,
            reply,
            state: conversation.state(),
            discomfort: conversation.escalation().discomfort(),
            has_patient_left: conversation.has_patient_left(),
        })
    }

    async fn conversation(&self, persona_id: &str) -> Result<ConversationSnapshot> {
        self.persona(persona_id).await?;
        let handle = self.conversations.handle(persona_id);
        let conversation = handle.lock().await;
        Ok(ConversationSnapshot::from(&*conversation))
    }

    async fn delete_message(
        &self,
        persona_id: &str,
        message_id: &str,
    ) -> Result<ConversationSnapshot> {
        self.persona(persona_id).await?;
        let handle = self
            .conversations
            .get(persona_id)
            .ok_or_else(|| AppError::NotFound(format!("message '{}' not found", message_id)))?;
        let mut conversation = handle.lock().await;

        match conversation.remove_message(message_id) {
            MessageRemoval::NotFound => {
                return Err(AppError::NotFound(format!(
                    "message '{}' not found",
                    message_id
                )));
            }
            MessageRemoval::RemovedAndResumed => {
                info!(persona_id, message_id, "Leaving message deleted, session resumed");
            }
            MessageRemoval::Removed => {
                debug!(persona_id, message_id, "Message deleted");
            }
        }

        Ok(ConversationSnapshot::from(&*conversation))
    }

    async fn reset(&self, persona_id: &str) -> Result<ConversationSnapshot> {
        self.persona(persona_id).await?;
        let handle = self.conversations.handle(persona_id);
        let mut conversation = handle.lock().await;
        conversation.reset();
        info!(persona_id, "Conversation reset");
        Ok(ConversationSnapshot::from(&*conversation))
    }
}
