use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::services::escalation::{Escalation, EscalationState};

/// 单个病人的对话
///
/// 每个病人一份，进程存活期间保留在内存中。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// 所属病人 ID
    pub persona_id: String,
    /// 按发送顺序排列的消息
    messages: Vec<Message>,
    /// 情绪升级状态
    escalation: Escalation,
    /// 创建时间
    pub started_at: DateTime<Utc>,
}

/// 删除消息的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRemoval {
    /// 消息不存在
    NotFound,
    /// 普通消息已删除
    Removed,
    /// 删除了离开消息，会话已恢复
    RemovedAndResumed,
}

impl Conversation {
    pub fn new(persona_id: &str) -> Self {
        Self {
            persona_id: persona_id.to_string(),
            messages: Vec::new(),
            escalation: Escalation::new(),
            started_at: Utc::now(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn escalation(&self) -> &Escalation {
        &self.escalation
    }

    pub fn escalation_mut(&mut self) -> &mut Escalation {
        &mut self.escalation
    }

    pub fn state(&self) -> EscalationState {
        self.escalation.state()
    }

    pub fn has_patient_left(&self) -> bool {
        self.escalation.has_patient_left()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// 按 ID 删除消息
    ///
    /// 删除带 `is_patient_leaving` 标记的消息时，累积值清零，会话恢复可写。
    pub fn remove_message(&mut self, message_id: &str) -> MessageRemoval {
        let Some(index) = self.messages.iter().position(|m| m.id == message_id) else {
            return MessageRemoval::NotFound;
        };

        let removed = self.messages.remove(index);
        if removed.is_patient_leaving {
            self.escalation.reset();
            MessageRemoval::RemovedAndResumed
        } else {
            MessageRemoval::Removed
        }
    }

    /// 清空对话，重新开始
    pub fn reset(&mut self) {
        self.messages.clear();
        self.escalation.reset();
        self.started_at = Utc::now();
    }
}
