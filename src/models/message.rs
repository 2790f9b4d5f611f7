use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 消息发送方
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// 治疗师（使用者）
    User,
    /// 虚拟病人
    Patient,
}

/// 病人回复的情绪标签
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Neutral,
    Uncomfortable,
    Upset,
}

/// 触发类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    /// 不专业的语言（辱骂、敌意、脏话、轻视、咆哮）
    Unprofessional,
    /// 病人档案中的治疗陷阱
    Pitfall,
    /// 针对特定病症的不敏感说法
    ConditionSpecific,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Unprofessional => "unprofessional",
            TriggerType::Pitfall => "pitfall",
            TriggerType::ConditionSpecific => "condition-specific",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 触发检测结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TriggerClassification {
    pub is_negative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    /// 严重程度，范围 [0, 1]
    pub severity: f64,
}

impl TriggerClassification {
    /// 未触发
    pub fn none() -> Self {
        Self {
            is_negative: false,
            trigger_type: None,
            severity: 0.0,
        }
    }

    pub fn negative(trigger_type: TriggerType, severity: f64) -> Self {
        Self {
            is_negative: true,
            trigger_type: Some(trigger_type),
            severity: severity.clamp(0.0, 1.0),
        }
    }
}

/// 对话消息
///
/// 创建后不可修改，只能按 ID 删除。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// 唯一标识（UUID v7，按时间有序）
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// 病人因此消息离开会话
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_patient_leaving: bool,
    /// 用户消息的触发检测结果
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerClassification>,
}

impl Message {
    fn new(sender: Sender, text: &str) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            sender,
            text: text.trim().to_string(),
            timestamp: Utc::now(),
            sentiment: None,
            is_patient_leaving: false,
            trigger: None,
        }
    }

    /// 创建用户消息
    pub fn user(text: &str, trigger: TriggerClassification) -> Self {
        let mut message = Self::new(Sender::User, text);
        message.trigger = Some(trigger);
        message
    }

    /// 创建病人消息
    pub fn patient(text: &str) -> Self {
        Self::new(Sender::Patient, text)
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// 标记为病人离开消息
    pub fn leaving(mut self) -> Self {
        self.is_patient_leaving = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text_is_trimmed() {
        let message = Message::user("  hello  ", TriggerClassification::none());
        assert_eq!(message.text, "hello");
        assert_eq!(message.sender, Sender::User);
        assert!(!message.is_patient_leaving);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let first = Message::patient("a");
        let second = Message::patient("b");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_trigger_type_serializes_kebab_case() {
        let json = serde_json::to_string(&TriggerType::ConditionSpecific).unwrap();
        assert_eq!(json, "\"condition-specific\"");
    }

    #[test]
    fn test_leaving_flag_only_serialized_when_set() {
        let calm = serde_json::to_value(Message::patient("ok")).unwrap();
        assert!(calm.get("is_patient_leaving").is_none());

        let leaving = serde_json::to_value(Message::patient("bye").leaving()).unwrap();
        assert_eq!(leaving["is_patient_leaving"], true);
    }
}
