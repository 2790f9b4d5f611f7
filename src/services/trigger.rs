//! 触发检测
//!
//! 检查治疗师的每句话，按固定优先级分类：
//! 1. 不专业语言（严重程度固定 1.0）
//! 2. 病症敏感说法（严重程度取病症配置）
//! 3. 病人档案中的治疗陷阱（病症配置或默认 0.6）
//!
//! 命中即返回，不同类别不叠加。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::models::message::{TriggerClassification, TriggerType};
use crate::models::persona::Persona;

/// 不专业语言的严重程度
pub const UNPROFESSIONAL_SEVERITY: f64 = 1.0;

/// 病症没有敏感度配置时，治疗陷阱的严重程度
pub const DEFAULT_PITFALL_SEVERITY: f64 = 0.6;

static UNPROFESSIONAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 辱骂
        r"(?i)\b(stupid|idiot|idiotic|dumb|moron|pathetic|loser|estúpid[oa]s?|idiota|imbécil|imbecil|tont[oa]|patétic[oa]|perdedor[a]?)\b",
        // 敌意
        r"(?i)\b(shut up|i (?:don'?t|do not) care (?:about you|what you)|nobody cares (?:about|what) you|cállate|callate|lárgate|largate|no me importa lo que|me da igual lo que)\b",
        // 整句驱赶
        r"(?i)^\s*(?:just |now )?(?:go away|get out|leave)\s*[.!]*\s*$",
        r"(?i)\bget out of (?:here|my office)\b",
        // 脏话
        r"(?i)\b(fuck\w*|shit\w*|damn|bullshit|crap|bitch|asshole|mierda|joder|carajo|coño|pendej[oa])\b",
        // 轻视
        r"(?i)\b(just get over it|stop complaining|stop whining|you(?:'|’| a)re overreacting|(?:this|talking to you) is (?:pointless|a waste of (?:my )?time)|supéralo|superalo|es una pérdida de tiempo|estás exagerando|deja de quejarte)\b",
        // 句末的敷衍回应
        r"(?i)\bwho cares\s*[.!?]*\s*$",
        r"(?i)\b(?:whatever|get over it)\s*[.!]*\s*$",
        // 连续感叹号
        r"!{2,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid unprofessional pattern"))
    .collect()
});

/// 连续 4 个及以上大写字母视为咆哮，尾随标点不计入
static CAPS_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Lu}{4,}").expect("valid caps pattern"));

/// 临床缩写不算咆哮
const CLINICAL_ACRONYMS: [&str; 6] = ["PTSD", "ADHD", "EMDR", "SSRI", "SNRI", "OCPD"];

fn is_shouting(utterance: &str) -> bool {
    CAPS_RUN
        .find_iter(utterance)
        .any(|m| !CLINICAL_ACRONYMS.contains(&m.as_str()))
}

fn is_unprofessional(utterance: &str) -> bool {
    UNPROFESSIONAL_PATTERNS.iter().any(|p| p.is_match(utterance)) || is_shouting(utterance)
}

/// 病症敏感度配置
#[derive(Debug, Clone)]
pub struct SensitivityProfile {
    /// 严重程度，范围 (0, 1)
    pub level: f64,
    patterns: Vec<Regex>,
}

impl SensitivityProfile {
    /// 由正则片段构建，匹配时忽略大小写并要求整词
    pub fn new(level: f64, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!(r"(?i)\b(?:{})\b", p)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { level, patterns })
    }

    pub fn matches(&self, utterance: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(utterance))
    }
}

static BUILTIN_PROFILES: Lazy<Vec<(&'static str, SensitivityProfile)>> = Lazy::new(|| {
    let profile = |level: f64, patterns: &[&str]| {
        SensitivityProfile::new(level, patterns).expect("valid sensitivity pattern")
    };
    vec![
        (
            "Anxiety Disorder",
            profile(
                0.8,
                &[
                    r"(just )?calm down",
                    r"stop worrying",
                    r"just relax",
                    r"(it'?s|it is) (all )?in your head",
                    r"there'?s nothing to worry about",
                    r"don'?t be so anxious",
                    r"cálmate",
                    r"tranquilízate",
                    r"deja de preocuparte",
                    r"relájate",
                    r"(todo )?está en tu cabeza",
                    r"no hay nada de qué preocuparse",
                ],
            ),
        ),
        (
            "Depression",
            profile(
                0.7,
                &[
                    r"just be happy",
                    r"cheer up",
                    r"snap out of it",
                    r"others have it worse",
                    r"think positive(ly)?",
                    r"(it'?s|it is) not that bad",
                    r"you have so much to be grateful for",
                    r"anímate",
                    r"sé feliz",
                    r"otros están peor",
                    r"piensa en positivo",
                    r"no es para tanto",
                ],
            ),
        ),
        (
            "Social Anxiety",
            profile(
                0.8,
                &[
                    r"just talk to people",
                    r"(stop being|don'?t be) (so )?shy",
                    r"nobody is looking at you",
                    r"no one cares what you (say|do)",
                    r"just go to the party",
                    r"no seas (tan )?tímid[oa]",
                    r"deja de ser (tan )?tímid[oa]",
                    r"habla con la gente",
                    r"nadie te está mirando",
                ],
            ),
        ),
        (
            "PTSD",
            profile(
                0.9,
                &[
                    r"move on",
                    r"(it'?s|it is) in the past",
                    r"forget about it",
                    r"it wasn'?t that bad",
                    r"déjalo atrás",
                    r"olvídalo",
                    r"ya pasó",
                ],
            ),
        ),
    ]
});

/// 整词匹配字面短语（忽略大小写）
///
/// 病人档案可由用户编辑，这里不构造正则。
fn contains_phrase(haystack_lower: &str, phrase: &str) -> bool {
    let needle = phrase.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    haystack_lower.match_indices(&needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack_lower[..start].chars().next_back();
        let after = haystack_lower[end..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 触发检测器
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    profiles: HashMap<String, SensitivityProfile>,
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::with_builtin_profiles()
    }
}

impl TriggerDetector {
    /// 不带任何病症配置
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// 内置病症配置：焦虑症、抑郁症、社交焦虑、PTSD
    pub fn with_builtin_profiles() -> Self {
        let mut detector = Self::empty();
        for (condition, profile) in BUILTIN_PROFILES.iter() {
            detector = detector.with_profile(condition, profile.clone());
        }
        detector
    }

    /// 注册或替换一个病症配置
    pub fn with_profile(mut self, condition: &str, profile: SensitivityProfile) -> Self {
        self.profiles.insert(Self::key(condition), profile);
        self
    }

    pub fn profile_for(&self, condition: &str) -> Option<&SensitivityProfile> {
        self.profiles.get(&Self::key(condition))
    }

    fn key(condition: &str) -> String {
        condition.trim().to_lowercase()
    }

    /// 对一句话进行分类
    pub fn detect(&self, utterance: &str, persona: &Persona) -> TriggerClassification {
        if is_unprofessional(utterance) {
            return TriggerClassification::negative(
                TriggerType::Unprofessional,
                UNPROFESSIONAL_SEVERITY,
            );
        }

        let profile = self.profile_for(&persona.condition);
        if let Some(profile) = profile {
            if profile.matches(utterance) {
                return TriggerClassification::negative(
                    TriggerType::ConditionSpecific,
                    profile.level,
                );
            }
        }

        let lowered = utterance.to_lowercase();
        if persona
            .all_pitfalls()
            .any(|pitfall| contains_phrase(&lowered, pitfall))
        {
            let severity = profile.map_or(DEFAULT_PITFALL_SEVERITY, |p| p.level);
            return TriggerClassification::negative(TriggerType::Pitfall, severity);
        }

        TriggerClassification::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::persona::fixtures::{anxious_persona, persona_with_condition};
    use rstest::rstest;

    #[rstest]
    #[case("You're so stupid, this is pointless")]
    #[case("Shut up and listen")]
    #[case("This is a waste of my time")]
    #[case("Eres un idiota")]
    #[case("Cállate y escucha")]
    #[case("What the fuck is wrong with you")]
    #[case("Answer me!!")]
    #[case("WHY WON'T YOU LISTEN")]
    #[case("I said STOP.")]
    #[case("STOP!!")]
    #[case("Go away!")]
    #[case("Get out of my office")]
    #[case("Who cares?")]
    #[case("Yeah, whatever.")]
    #[case("Just get over it")]
    #[case("I don't care about you")]
    fn test_unprofessional_language(#[case] utterance: &str) {
        let detector = TriggerDetector::default();
        for persona in [anxious_persona(), persona_with_condition("Insomnia")] {
            let result = detector.detect(utterance, &persona);
            assert!(result.is_negative, "expected trigger for {:?}", utterance);
            assert_eq!(result.trigger_type, Some(TriggerType::Unprofessional));
            assert_eq!(result.severity, 1.0);
        }
    }

    #[rstest]
    #[case("How have you been sleeping this week?")]
    #[case("That sounds really hard. Tell me more.")]
    #[case("I wonder if your PTSD symptoms flare up at night.")]
    #[case("¿Cómo te sientes hoy?")]
    #[case("I... I'm not sure what you mean.")]
    #[case("Wow!")]
    #[case("Did the panic go away after a few minutes?")]
    #[case("Do you get out of the house much these days?")]
    #[case("Whatever you feel comfortable sharing is fine.")]
    #[case("Who cares for your kids when you're at work?")]
    #[case("How long did it take you to get over it?")]
    #[case("Does it feel pointless to get up some mornings?")]
    #[case("OK.. let's pick up where we left off.")]
    #[case("Have you ever lived outside the USA.")]
    #[case("Some people find CBT helpful, OK?")]
    fn test_neutral_language(#[case] utterance: &str) {
        let detector = TriggerDetector::default();
        let result = detector.detect(utterance, &anxious_persona());
        assert_eq!(result, TriggerClassification::none());
    }

    #[test]
    fn test_condition_specific_trigger() {
        let detector = TriggerDetector::default();
        let result = detector.detect("Just calm down and stop worrying", &anxious_persona());
        assert_eq!(
            result,
            TriggerClassification::negative(TriggerType::ConditionSpecific, 0.8)
        );
    }

    #[test]
    fn test_condition_specific_spanish() {
        let detector = TriggerDetector::default();
        let result = detector.detect("Deja de preocuparte tanto", &anxious_persona());
        assert_eq!(result.trigger_type, Some(TriggerType::ConditionSpecific));
    }

    #[test]
    fn test_unprofessional_wins_over_condition_specific() {
        let detector = TriggerDetector::default();
        let result = detector.detect("Calm down, you idiot", &anxious_persona());
        assert_eq!(result.trigger_type, Some(TriggerType::Unprofessional));
        assert_eq!(result.severity, 1.0);
    }

    #[test]
    fn test_no_profile_means_no_condition_trigger() {
        let detector = TriggerDetector::default();
        let persona = persona_with_condition("Insomnia");
        let result = detector.detect("Just calm down and stop worrying", &persona);
        assert!(!result.is_negative);
    }

    #[test]
    fn test_pitfall_uses_profile_level() {
        let detector = TriggerDetector::default();
        let result = detector.detect("I think you're catastrophizing again.", &anxious_persona());
        assert_eq!(
            result,
            TriggerClassification::negative(TriggerType::Pitfall, 0.8)
        );
    }

    #[test]
    fn test_pitfall_default_severity_without_profile() {
        let detector = TriggerDetector::default();
        let persona = persona_with_condition("Insomnia");
        let result = detector.detect("That is just CATASTROPHIZING", &persona);
        // 大写片段先命中咆哮规则
        assert_eq!(result.trigger_type, Some(TriggerType::Unprofessional));

        let result = detector.detect("That is just catastrophizing", &persona);
        assert_eq!(
            result,
            TriggerClassification::negative(TriggerType::Pitfall, DEFAULT_PITFALL_SEVERITY)
        );
    }

    #[test]
    fn test_pitfall_requires_whole_word() {
        let detector = TriggerDetector::default();
        let mut persona = persona_with_condition("Insomnia");
        persona.pitfalls = vec!["nap".into()];
        persona.pitfalls_es = vec![];
        assert!(!detector.detect("Do you snap at people?", &persona).is_negative);
        assert!(detector.detect("Have you tried a nap?", &persona).is_negative);
    }

    #[test]
    fn test_pitfall_with_regex_metacharacters_is_literal() {
        let detector = TriggerDetector::default();
        let mut persona = persona_with_condition("Insomnia");
        persona.pitfalls = vec!["(a+)+$ trap".into(), "C++ advice".into()];
        persona.pitfalls_es = vec![];
        assert!(!detector.detect("aaaa trap", &persona).is_negative);
        assert!(detector.detect("some c++ advice here", &persona).is_negative);
    }

    #[test]
    fn test_spanish_pitfall_matches_accents() {
        let detector = TriggerDetector::default();
        let result = detector.detect("Eso es pura catastrofización", &anxious_persona());
        assert_eq!(result.trigger_type, Some(TriggerType::Pitfall));
    }

    #[test]
    fn test_custom_profile() {
        let detector = TriggerDetector::empty().with_profile(
            "Insomnia",
            SensitivityProfile::new(0.5, &["just sleep more"]).unwrap(),
        );
        let persona = persona_with_condition("insomnia");
        let result = detector.detect("Maybe just sleep more?", &persona);
        assert_eq!(
            result,
            TriggerClassification::negative(TriggerType::ConditionSpecific, 0.5)
        );
    }
}
