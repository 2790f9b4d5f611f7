//! 病人 DTO

use serde::{Deserialize, Serialize};

use crate::models::persona::Persona;

/// 病人列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct PersonaListResponse {
    pub personas: Vec<Persona>,
    pub total: usize,
}

impl From<Vec<Persona>> for PersonaListResponse {
    fn from(personas: Vec<Persona>) -> Self {
        Self {
            total: personas.len(),
            personas,
        }
    }
}
