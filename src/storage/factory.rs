//! 存储工厂模块
//!
//! 根据配置创建病人仓储。

use tracing::info;

use crate::config::config::PersonaConfig;
use crate::error::Result;
use crate::models::persona::Persona;
use crate::storage::repository::{InMemoryPersonaRepository, Repository};

/// 病人仓储：配置了目录文件时从文件加载，否则使用内置目录
pub fn create_persona_repository(config: &PersonaConfig) -> Result<Box<dyn Repository<Persona>>> {
    let repository = match &config.catalog_path {
        Some(path) => {
            info!(path = %path.display(), "Loading persona catalog from file");
            InMemoryPersonaRepository::from_file(path)?
        }
        None => InMemoryPersonaRepository::builtin()?,
    };
    Ok(Box::new(repository))
}
