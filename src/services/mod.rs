//! 服务模块

pub mod chat;
pub mod completion;
pub mod escalation;
pub mod generator;
pub mod ingestion;
pub mod persona;
pub mod picker;
pub mod prompt;
pub mod reactions;
pub mod responder;
pub mod trigger;

pub use chat::{
    ChatService, ChatServiceImpl, ChatSettings, ChatTurnRequest, ChatTurnResult,
    ConversationSnapshot,
};
pub use completion::{CompletionGateway, CompletionRequest, create_completion_gateway};
pub use escalation::{Escalation, EscalationOutcome, EscalationState};
pub use generator::PersonaGenerator;
pub use ingestion::{IngestionService, UploadReport, UploadedFile, create_ingestion_service};
pub use persona::{PersonaService, create_persona_service};
pub use picker::{FixedPicker, ResponsePicker, SeededPicker};
pub use trigger::TriggerDetector;
