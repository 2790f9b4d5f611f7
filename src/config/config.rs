use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节），同时限制上传文件
    pub max_request_size: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 补全服务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompletionConfig {
    /// 后端类型: "openai" 或 "offline"
    pub backend: String,
    /// OpenAI 兼容接口地址
    pub api_base: String,
    /// API 密钥（为空时回退到 OPENAI_API_KEY）
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 采样温度
    pub temperature: f32,
    /// 回复长度上限（token）
    pub max_tokens: u32,
    /// 请求超时（秒）
    pub timeout: u64,
}

impl CompletionConfig {
    /// 是否需要调用外部补全服务
    pub fn is_online(&self) -> bool {
        self.backend == "openai" && !self.api_key.trim().is_empty()
    }
}

/// 嵌入模型配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding 后端类型: "ollama" 或 "simple"
    pub backend: String,
    /// 模型名称
    pub model_name: String,
    /// Ollama 服务器地址
    pub ollama_url: String,
    /// Ollama 请求超时（秒）
    pub ollama_timeout: u64,
    /// 向量维度
    pub dimension: usize,
}

/// 知识库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 每次检索返回的片段数量
    pub result_limit: usize,
    /// 上传书籍的保存目录
    pub books_dir: PathBuf,
    /// 上传状态保留时间（秒）
    pub status_ttl_secs: u64,
    /// 分块最小字符数
    pub min_chunk_chars: usize,
}

/// 病人档案配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersonaConfig {
    /// 自定义病人目录 JSON 文件
    pub catalog_path: Option<PathBuf>,
    /// 随机数种子（固定后预设回复可复现）
    pub rng_seed: Option<u64>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 补全服务配置
    pub completion: CompletionConfig,
    /// 嵌入模型配置
    pub embedding: EmbeddingConfig,
    /// 知识库配置
    pub knowledge: KnowledgeConfig,
    /// 病人档案配置
    pub personas: PersonaConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout: 120,
                max_request_size: 50 * 1024 * 1024,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            completion: CompletionConfig {
                backend: "openai".into(),
                api_base: "https://api.openai.com/v1".into(),
                api_key: String::new(),
                model: "gpt-4-turbo-preview".into(),
                temperature: 0.7,
                max_tokens: 500,
                timeout: 60,
            },
            embedding: EmbeddingConfig {
                backend: "simple".into(),
                model_name: "nomic-embed-text".into(),
                ollama_url: "http://localhost:11434".into(),
                ollama_timeout: 60,
                dimension: 384,
            },
            knowledge: KnowledgeConfig {
                result_limit: 3,
                books_dir: PathBuf::from("./books"),
                status_ttl_secs: 3600,
                min_chunk_chars: 50,
            },
            personas: PersonaConfig {
                catalog_path: None,
                rng_seed: None,
            },
            app_name: "vpatient".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config
    }
}
