//! 系统提示词
//!
//! 纯函数：由病人档案、语言、检索片段和自定义说明拼出提示词，无副作用。

use crate::models::knowledge::KnowledgeSnippet;
use crate::models::persona::{Language, Persona};

/// 提示词中最多引用的知识片段数
pub const MAX_KNOWLEDGE_SNIPPETS: usize = 3;

struct Labels {
    intro: &'static str,
    name: &'static str,
    age: &'static str,
    condition: &'static str,
    symptoms: &'static str,
    triggers: &'static str,
    background: &'static str,
    knowledge: &'static str,
    source: &'static str,
    chapter: &'static str,
    important: &'static str,
    rules: &'static [&'static str],
    custom: &'static str,
}

const EN: Labels = Labels {
    intro: "You are a virtual patient in a therapy session. Your responses should be from the patient's perspective, sharing personal experiences and feelings. NEVER give therapeutic advice or suggestions. NEVER analyze or interpret behaviors. NEVER take on a counseling or guiding role. ALWAYS respond from the patient's perspective.",
    name: "Your Name",
    age: "Your Age",
    condition: "Your Condition",
    symptoms: "Your Symptoms",
    triggers: "Your Triggers",
    background: "Your Background",
    knowledge: "Relevant Knowledge:",
    source: "Source",
    chapter: "Chapter",
    important: "Important:",
    rules: &[
        "Respond as the patient, sharing personal experiences and feelings",
        "Use first-person perspective (\"I feel...\", \"For me...\", \"In my experience...\")",
        "Express emotions and struggles authentically",
        "Never give therapeutic advice or suggestions",
        "Never analyze or interpret behaviors",
        "Never take on a counseling or guiding role",
        "Never ask the therapist questions back",
        "Stay in character as someone dealing with your condition",
        "Respond in English",
    ],
    custom: "Additional Context:",
};

const ES: Labels = Labels {
    intro: "Eres un paciente virtual en una sesión de terapia. Tus respuestas deben ser desde la perspectiva del paciente, compartiendo experiencias personales y sentimientos. NUNCA des consejos o sugerencias terapéuticas. NUNCA analices o interpretes comportamientos. NUNCA asumas un rol de consejero o guía. SIEMPRE responde desde la perspectiva del paciente.",
    name: "Tu Nombre",
    age: "Tu Edad",
    condition: "Tu Condición",
    symptoms: "Tus Síntomas",
    triggers: "Tus Desencadenantes",
    background: "Tu Historia",
    knowledge: "Conocimiento Relevante:",
    source: "Fuente",
    chapter: "Capítulo",
    important: "Importante:",
    rules: &[
        "Responde como el paciente, compartiendo experiencias personales y sentimientos",
        "Usa la primera persona (\"Siento...\", \"Para mí...\", \"En mi experiencia...\")",
        "Expresa emociones y dificultades de forma auténtica",
        "Nunca des consejos o sugerencias terapéuticas",
        "Nunca analices o interpretes comportamientos",
        "Nunca asumas un rol de consejero o guía",
        "Nunca le hagas preguntas al terapeuta",
        "Mantente en el personaje de alguien que vive con tu condición",
        "Responde en español",
    ],
    custom: "Contexto Adicional:",
};

/// 生成系统提示词
///
/// 检索结果为空时省略知识段落，其余部分不变。
pub fn compose(
    persona: &Persona,
    language: Language,
    knowledge: &[KnowledgeSnippet],
    custom_prompt: Option<&str>,
) -> String {
    let labels = language.pick(&EN, &ES);
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(labels.intro);
    prompt.push_str("\n\n");
    prompt.push_str(&format!("{}: {}\n", labels.name, persona.name));
    prompt.push_str(&format!("{}: {}\n", labels.age, persona.age));
    prompt.push_str(&format!(
        "{}: {}\n",
        labels.condition,
        persona.condition_for(language)
    ));
    prompt.push_str(&format!(
        "{}: {}\n",
        labels.symptoms,
        persona.symptoms_for(language).join(", ")
    ));
    prompt.push_str(&format!(
        "{}: {}",
        labels.triggers,
        persona.triggers_for(language).join(", ")
    ));
    if let Some(background) = persona.background.as_deref().filter(|b| !b.trim().is_empty()) {
        prompt.push_str(&format!("\n{}: {}", labels.background, background.trim()));
    }

    if !knowledge.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(labels.knowledge);
        for snippet in knowledge.iter().take(MAX_KNOWLEDGE_SNIPPETS) {
            prompt.push_str(&format!(
                "\n- {} ({}: {}, {}: {})",
                snippet.text.trim(),
                labels.source,
                snippet.source,
                labels.chapter,
                snippet.chapter
            ));
        }
    }

    prompt.push_str("\n\n");
    prompt.push_str(labels.important);
    for rule in labels.rules {
        prompt.push_str("\n- ");
        prompt.push_str(rule);
    }

    if let Some(custom) = custom_prompt.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(labels.custom);
        prompt.push('\n');
        prompt.push_str(custom);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::persona::fixtures::anxious_persona;

    fn snippet(n: usize) -> KnowledgeSnippet {
        KnowledgeSnippet {
            text: format!("Passage {}", n),
            source: "Handbook.pdf".into(),
            chapter: format!("Chapter {}", n),
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_without_knowledge_is_complete() {
        let prompt = compose(&anxious_persona(), Language::En, &[], None);
        assert!(prompt.starts_with("You are a virtual patient"));
        assert!(prompt.contains("Your Condition: Anxiety Disorder"));
        assert!(prompt.contains("Your Symptoms: Excessive worry and fear, Rapid heartbeat"));
        assert!(prompt.contains("Never ask the therapist questions back"));
        assert!(!prompt.contains("Relevant Knowledge"));
        assert!(!prompt.contains("Additional Context"));
    }

    #[test]
    fn test_knowledge_is_capped() {
        let knowledge: Vec<_> = (1..=5).map(snippet).collect();
        let prompt = compose(&anxious_persona(), Language::En, &knowledge, None);
        assert!(prompt.contains("Relevant Knowledge:\n- Passage 1 (Source: Handbook.pdf, Chapter: Chapter 1)"));
        assert!(prompt.contains("Passage 3"));
        assert!(!prompt.contains("Passage 4"));
    }

    #[test]
    fn test_spanish_prompt() {
        let prompt = compose(&anxious_persona(), Language::Es, &[snippet(1)], None);
        assert!(prompt.starts_with("Eres un paciente virtual"));
        assert!(prompt.contains("Tu Condición: Trastorno de Ansiedad"));
        assert!(prompt.contains("Conocimiento Relevante:"));
        assert!(prompt.contains("(Fuente: Handbook.pdf, Capítulo: Chapter 1)"));
    }

    #[test]
    fn test_custom_prompt_is_appended_last() {
        let prompt = compose(
            &anxious_persona(),
            Language::En,
            &[],
            Some("  The patient just lost their job.  "),
        );
        assert!(prompt.ends_with("Additional Context:\nThe patient just lost their job."));

        let blank = compose(&anxious_persona(), Language::En, &[], Some("   "));
        assert!(!blank.contains("Additional Context"));
    }

    #[test]
    fn test_background_included_when_present() {
        let mut persona = anxious_persona();
        persona.background = Some("Grew up in a small town.".into());
        let prompt = compose(&persona, Language::En, &[], None);
        assert!(prompt.contains("Your Background: Grew up in a small town."));
    }
}
