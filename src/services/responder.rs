//! 离线回复
//!
//! 没有配置补全服务时，按关键词从病人自己的回复库中抽取回复。

use crate::models::persona::{Language, Persona, DEFAULT_CATEGORY};
use crate::services::picker::{choose, ResponsePicker};

const SLEEP_KEYWORDS: &[&str] = &["sleep", "rest", "tired", "dormir", "descanso", "cansado"];
const WORK_KEYWORDS: &[&str] = &["work", "job", "career", "trabajo", "empleo", "carrera"];
const SOCIAL_KEYWORDS: &[&str] = &["party", "social", "friend", "fiesta", "amigo"];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// 根据关键词确定回复类别
///
/// 社交话题优先使用 `party`，病人没有该类别时改用 `social`。
pub fn topic_for(utterance: &str, persona: &Persona, language: Language) -> &'static str {
    let lowered = utterance.to_lowercase();
    if mentions_any(&lowered, SLEEP_KEYWORDS) {
        "sleep"
    } else if mentions_any(&lowered, WORK_KEYWORDS) {
        "work"
    } else if mentions_any(&lowered, SOCIAL_KEYWORDS) {
        if persona.responses_for(language).has_category("party") {
            "party"
        } else {
            "social"
        }
    } else {
        DEFAULT_CATEGORY
    }
}

/// 从回复库抽取一条离线回复；类别缺失时回退到 default
pub fn offline_reply(
    persona: &Persona,
    utterance: &str,
    language: Language,
    picker: &dyn ResponsePicker,
) -> Option<String> {
    let topic = topic_for(utterance, persona, language);
    let candidates = persona.responses_for(language).lookup(topic);
    choose(picker, candidates).cloned()
}
