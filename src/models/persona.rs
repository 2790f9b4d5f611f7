use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 默认回复类别，每个回复库都必须包含
pub const DEFAULT_CATEGORY: &str = "default";

/// 会话语言
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 英语
    #[default]
    En,
    /// 西班牙语
    Es,
}

impl Language {
    /// 按语言选择文本
    pub fn pick<'a, T: ?Sized>(&self, en: &'a T, es: &'a T) -> &'a T {
        match self {
            Language::En => en,
            Language::Es => es,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Es => write!(f, "es"),
        }
    }
}

/// 回复库
///
/// 话题类别 → 候选回复列表。未知类别回退到 `default`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct ResponseBank(BTreeMap<String, Vec<String>>);

impl ResponseBank {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 添加或替换一个类别
    pub fn with_category(mut self, category: &str, responses: Vec<String>) -> Self {
        self.0.insert(category.to_string(), responses);
        self
    }

    /// 查找类别；缺失或为空时回退到 default
    pub fn lookup(&self, category: &str) -> &[String] {
        match self.0.get(category) {
            Some(responses) if !responses.is_empty() => responses,
            _ => self.default_responses(),
        }
    }

    /// 类别是否存在且非空
    pub fn has_category(&self, category: &str) -> bool {
        self.0.get(category).is_some_and(|r| !r.is_empty())
    }

    pub fn default_responses(&self) -> &[String] {
        self.0
            .get(DEFAULT_CATEGORY)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// 校验：必须有非空 default，且不允许空类别
    pub fn validate(&self, field: &str) -> Result<(), String> {
        if self.default_responses().is_empty() {
            return Err(format!("{} must contain a non-empty 'default' category", field));
        }
        if let Some((category, _)) = self.0.iter().find(|(_, r)| r.is_empty()) {
            return Err(format!("{} category '{}' is empty", field, category));
        }
        if self.0.values().flatten().any(|r| r.trim().is_empty()) {
            return Err(format!("{} contains a blank response", field));
        }
        Ok(())
    }
}

/// 病人档案
///
/// 一次会话内不可变，会话之间可以编辑。所有列表都带西班牙语版本。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Persona {
    /// 唯一标识
    #[serde(default)]
    pub id: String,
    /// 姓名
    pub name: String,
    /// 年龄
    pub age: u32,
    /// 病症（标准名称）
    pub condition: String,
    /// 病症（西班牙语）
    pub condition_es: String,
    /// 列表预览中显示的最后一句话
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_es: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub symptoms_es: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub triggers_es: Vec<String>,
    #[serde(default)]
    pub therapeutic_approaches: Vec<String>,
    #[serde(default)]
    pub therapeutic_approaches_es: Vec<String>,
    /// 治疗中容易犯的错误
    #[serde(default)]
    pub pitfalls: Vec<String>,
    #[serde(default)]
    pub pitfalls_es: Vec<String>,
    /// 背景故事
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// 英语回复库
    pub responses: ResponseBank,
    /// 西班牙语回复库
    pub responses_es: ResponseBank,
}

impl Persona {
    pub fn condition_for(&self, language: Language) -> &str {
        language.pick(self.condition.as_str(), self.condition_es.as_str())
    }

    pub fn symptoms_for(&self, language: Language) -> &[String] {
        language.pick(self.symptoms.as_slice(), self.symptoms_es.as_slice())
    }

    pub fn triggers_for(&self, language: Language) -> &[String] {
        language.pick(self.triggers.as_slice(), self.triggers_es.as_slice())
    }

    pub fn responses_for(&self, language: Language) -> &ResponseBank {
        language.pick(&self.responses, &self.responses_es)
    }

    /// 两种语言的全部陷阱短语
    pub fn all_pitfalls(&self) -> impl Iterator<Item = &str> {
        self.pitfalls
            .iter()
            .chain(self.pitfalls_es.iter())
            .map(String::as_str)
    }

    /// 校验档案
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.condition.trim().is_empty() {
            return Err("condition cannot be empty".to_string());
        }
        if self.age == 0 || self.age > 120 {
            return Err(format!("age must be between 1 and 120, got {}", self.age));
        }
        self.responses.validate("responses")?;
        self.responses_es.validate("responses_es")?;
        Ok(())
    }
}
