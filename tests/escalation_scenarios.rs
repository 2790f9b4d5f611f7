// End-to-end escalation scenarios
//
// Tests cover:
// - Trigger precedence and severities
// - Accumulated discomfort and leaving
// - Recovery after deleting the leaving message
// - Prompt composition without knowledge

use std::sync::Arc;

use rstest::rstest;
use vpatient::config::config::AppConfig;
use vpatient::index::{KnowledgeRetriever, create_knowledge_base};
use vpatient::models::message::{Sentiment, TriggerType};
use vpatient::models::persona::{Language, Persona};
use vpatient::observability::AppMetrics;
use vpatient::services::chat::{ChatService, ChatServiceImpl, ChatTurnRequest};
use vpatient::services::escalation::{Escalation, EscalationState};
use vpatient::services::picker::FixedPicker;
use vpatient::services::prompt;
use vpatient::services::reactions::leaving_suffix;
use vpatient::services::trigger::TriggerDetector;
use vpatient::storage::{ConversationStore, InMemoryPersonaRepository, Repository};

async fn builtin_persona(id: &str) -> Persona {
    InMemoryPersonaRepository::builtin()
        .unwrap()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
}

fn chat_service() -> ChatServiceImpl {
    let knowledge: Arc<dyn KnowledgeRetriever> =
        Arc::from(create_knowledge_base(&AppConfig::development().embedding).unwrap());
    ChatServiceImpl::new(
        Arc::new(InMemoryPersonaRepository::builtin().unwrap()),
        Arc::new(ConversationStore::new()),
        knowledge,
        Arc::new(FixedPicker(0)),
        Arc::new(AppMetrics::default()),
    )
}

fn say(text: &str) -> ChatTurnRequest {
    ChatTurnRequest {
        text: text.to_string(),
        language: Language::En,
        custom_prompt: None,
    }
}

#[rstest]
#[case("sarah-johnson", "You're so stupid")]
#[case("michael-chen", "Shut up and listen")]
#[case("emma-wilson", "WHY DON'T YOU JUST TRY")]
#[tokio::test]
async fn unprofessional_language_is_always_full_severity(#[case] id: &str, #[case] text: &str) {
    let persona = builtin_persona(id).await;
    let trigger = TriggerDetector::default().detect(text, &persona);
    assert!(trigger.is_negative);
    assert_eq!(trigger.trigger_type, Some(TriggerType::Unprofessional));
    assert_eq!(trigger.severity, 1.0);
}

#[tokio::test]
async fn condition_triggers_need_a_profile() {
    let mut persona = builtin_persona("sarah-johnson").await;
    persona.condition = "Insomnia".to_string();
    let trigger = TriggerDetector::default().detect("Just calm down", &persona);
    assert!(!trigger.is_negative);
}

#[test]
fn full_severity_trigger_leaves_from_any_accumulator() {
    for prior in [0.0, 0.3, 0.7] {
        let mut escalation = Escalation::new();
        if prior > 0.0 {
            escalation.register(prior);
        }
        assert!(escalation.register(1.0).patient_leaves);
        assert_eq!(escalation.state(), EscalationState::Left);
    }
}

#[tokio::test]
async fn anxiety_scenario_escalates_then_leaves() {
    let service = chat_service();

    let first = service
        .send("sarah-johnson", say("Just calm down and stop worrying"))
        .await
        .unwrap();
    let trigger = first.user_message.trigger.unwrap();
    assert_eq!(trigger.trigger_type, Some(TriggerType::ConditionSpecific));
    assert_eq!(trigger.severity, 0.8);
    assert_eq!(first.state, EscalationState::Escalating);
    assert!((first.discomfort - 0.8).abs() < 1e-9);
    assert_eq!(first.reply.sentiment, Some(Sentiment::Uncomfortable));
    assert!(!first.reply.text.ends_with(leaving_suffix(Language::En)));

    let second = service
        .send("sarah-johnson", say("You're so stupid, this is pointless"))
        .await
        .unwrap();
    let trigger = second.user_message.trigger.unwrap();
    assert_eq!(trigger.trigger_type, Some(TriggerType::Unprofessional));
    assert!((second.discomfort - 1.8).abs() < 1e-9);
    assert_eq!(second.state, EscalationState::Left);
    assert!(second.reply.is_patient_leaving);
    assert!(second.reply.text.ends_with(leaving_suffix(Language::En)));
}

#[tokio::test]
async fn social_anxiety_leaves_after_second_trigger() {
    let service = chat_service();

    let first = service
        .send("emma-wilson", say("Just talk to people"))
        .await
        .unwrap();
    assert_eq!(first.state, EscalationState::Escalating);
    assert!(!first.has_patient_left);

    let second = service
        .send("emma-wilson", say("Nobody is looking at you"))
        .await
        .unwrap();
    assert!(second.has_patient_left);
    assert!(second.reply.is_patient_leaving);
    // 0.8 并不大于 0.8，不附加更换治疗师的话
    assert!(!second.reply.text.ends_with(leaving_suffix(Language::En)));
}

#[tokio::test]
async fn deleting_leaving_message_allows_a_fresh_start() {
    let service = chat_service();
    let left = service
        .send("michael-chen", say("You are pathetic"))
        .await
        .unwrap();
    assert!(left.has_patient_left);

    let snapshot = service
        .delete_message("michael-chen", &left.reply.id)
        .await
        .unwrap();
    assert_eq!(snapshot.state, EscalationState::Calm);
    assert_eq!(snapshot.discomfort, 0.0);

    let next = service
        .send("michael-chen", say("How was your week?"))
        .await
        .unwrap();
    assert_eq!(next.state, EscalationState::Calm);
    assert!(!next.has_patient_left);
    assert!(!next.reply.is_patient_leaving);
}

#[tokio::test]
async fn prompt_without_knowledge_is_complete() {
    let persona = builtin_persona("michael-chen").await;
    for language in [Language::En, Language::Es] {
        let system_prompt = prompt::compose(&persona, language, &[], None);
        assert!(system_prompt.contains(&persona.name));
        assert!(system_prompt.contains(persona.condition_for(language)));
        assert!(!system_prompt.contains("Relevant Knowledge"));
        assert!(!system_prompt.contains("Conocimiento Relevante"));
        assert!(!system_prompt.trim().is_empty());
    }
}
