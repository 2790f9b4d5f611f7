//! 情绪升级状态机
//!
//! 在会话内累积不适值，决定病人是表达不满还是离开会话。
//!
//! ```text
//! Calm ──trigger──▶ Escalating ──(累积 > 1.5 或 单次 > 0.8)──▶ Left
//!   ▲                                                           │
//!   └───────────────── 删除离开消息 ─────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// 累积不适值超过该阈值时病人离开
pub const LEAVE_THRESHOLD: f64 = 1.5;

/// 单次严重程度超过该值时病人直接离开，并要求更换治疗师
pub const SEVERE_SEVERITY: f64 = 0.8;

/// 会话情绪状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EscalationState {
    #[default]
    Calm,
    Escalating,
    /// 终态：只允许删除消息
    Left,
}

/// 一次触发后的状态机输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscalationOutcome {
    /// 本次触发后的累积值
    pub discomfort: f64,
    /// 病人是否因此离开
    pub patient_leaves: bool,
    /// 单次触发是否严重（决定是否附加更换治疗师的话）
    pub severe: bool,
}

/// 不适值累加器
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Escalation {
    discomfort: f64,
    state: EscalationState,
}

impl Escalation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    pub fn discomfort(&self) -> f64 {
        self.discomfort
    }

    pub fn has_patient_left(&self) -> bool {
        self.state == EscalationState::Left
    }

    /// 记录一次负面触发
    ///
    /// 已经离开的会话不再累积，调用方应在此之前拒绝输入。
    pub fn register(&mut self, severity: f64) -> EscalationOutcome {
        let severity = severity.clamp(0.0, 1.0);
        if self.has_patient_left() {
            return EscalationOutcome {
                discomfort: self.discomfort,
                patient_leaves: true,
                severe: severity > SEVERE_SEVERITY,
            };
        }

        self.discomfort += severity;
        let severe = severity > SEVERE_SEVERITY;
        let patient_leaves = self.discomfort > LEAVE_THRESHOLD || severe;

        self.state = if patient_leaves {
            EscalationState::Left
        } else if self.discomfort > 0.0 {
            EscalationState::Escalating
        } else {
            EscalationState::Calm
        };

        EscalationOutcome {
            discomfort: self.discomfort,
            patient_leaves,
            severe,
        }
    }

    /// 回到初始状态，累积值清零
    pub fn reset(&mut self) {
        self.discomfort = 0.0;
        self.state = EscalationState::Calm;
    }
}
