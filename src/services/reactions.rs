//! 病人对负面触发的预设反应

use crate::models::message::{Sentiment, TriggerType};
use crate::models::persona::Language;
use crate::services::escalation::EscalationOutcome;
use crate::services::picker::{choose, ResponsePicker};

const UNPROFESSIONAL_EN: &[&str] = &[
    "I don't think that's an appropriate way to talk to me.",
    "That really hurt. I came here for help, not to be insulted.",
    "I don't feel respected right now.",
    "Why are you talking to me like that?",
];

const UNPROFESSIONAL_ES: &[&str] = &[
    "No creo que esa sea una forma apropiada de hablarme.",
    "Eso me dolió mucho. Vine aquí buscando ayuda, no para que me insulten.",
    "No me siento respetado en este momento.",
    "¿Por qué me habla así?",
];

const PITFALL_EN: &[&str] = &[
    "I don't think you really understand what I'm going through.",
    "That makes me feel like I'm doing something wrong.",
    "I've heard that before, and it never helps.",
    "I feel like you're not listening to me.",
];

const PITFALL_ES: &[&str] = &[
    "No creo que realmente entienda lo que estoy pasando.",
    "Eso me hace sentir que estoy haciendo algo mal.",
    "Ya he escuchado eso antes y nunca ayuda.",
    "Siento que no me está escuchando.",
];

const CONDITION_SPECIFIC_EN: &[&str] = &[
    "If it were that easy, I wouldn't be here.",
    "You make it sound so simple. It isn't.",
    "That's exactly what everyone tells me, and it makes it worse.",
    "I can't just switch it off.",
];

const CONDITION_SPECIFIC_ES: &[&str] = &[
    "Si fuera tan fácil, no estaría aquí.",
    "Lo hace sonar tan simple. No lo es.",
    "Eso es exactamente lo que todos me dicen, y lo empeora.",
    "No puedo simplemente apagarlo.",
];

const LEAVING_SUFFIX_EN: &str = " I think I need a different therapist.";
const LEAVING_SUFFIX_ES: &str = " Creo que necesito un terapeuta diferente.";

const FALLBACK_EN: &str = "I'm sorry, I'm having trouble responding right now.";
const FALLBACK_ES: &str = "Lo siento, estoy teniendo problemas para responder en este momento.";

/// 某类触发在指定语言下的候选反应
pub fn reactions_for(trigger_type: TriggerType, language: Language) -> &'static [&'static str] {
    match trigger_type {
        TriggerType::Unprofessional => language.pick(UNPROFESSIONAL_EN, UNPROFESSIONAL_ES),
        TriggerType::Pitfall => language.pick(PITFALL_EN, PITFALL_ES),
        TriggerType::ConditionSpecific => {
            language.pick(CONDITION_SPECIFIC_EN, CONDITION_SPECIFIC_ES)
        }
    }
}

/// 补全失败时的兜底回复
pub fn fallback_reply(language: Language) -> &'static str {
    language.pick(FALLBACK_EN, FALLBACK_ES)
}

pub fn leaving_suffix(language: Language) -> &'static str {
    language.pick(LEAVING_SUFFIX_EN, LEAVING_SUFFIX_ES)
}

/// 组装好的病人反应
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub text: String,
    pub sentiment: Sentiment,
    pub is_patient_leaving: bool,
}

/// 根据触发类型和状态机输出生成反应
///
/// 只有单次严重触发才附加更换治疗师的后缀，累积超阈值时不附加。
pub fn react(
    trigger_type: TriggerType,
    outcome: &EscalationOutcome,
    language: Language,
    picker: &dyn ResponsePicker,
) -> Reaction {
    let bank = reactions_for(trigger_type, language);
    let mut text = choose(picker, bank)
        .copied()
        .unwrap_or_else(|| fallback_reply(language))
        .to_string();
    if outcome.severe {
        text.push_str(leaving_suffix(language));
    }

    let sentiment = if outcome.patient_leaves {
        Sentiment::Upset
    } else {
        Sentiment::Uncomfortable
    };

    Reaction {
        text,
        sentiment,
        is_patient_leaving: outcome.patient_leaves,
    }
}
