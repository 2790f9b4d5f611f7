//! 随机病人生成
//!
//! 以目录中的病人为病症模板，抽样组合出新的病人。西班牙语列表按相同下标抽取，两种语言保持对应。

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::persona::{DEFAULT_CATEGORY, Persona, ResponseBank};
use crate::services::picker::{ResponsePicker, choose};

const FIRST_NAMES: &[&str] = &[
    "James", "Emma", "Michael", "Olivia", "William", "Sophia", "David", "Isabella", "Joseph",
    "Mia", "Carlos", "Elena", "Jamal", "Aisha", "Wei", "Mei", "Raj", "Priya",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Chen", "Wong", "Patel", "Singh", "Kim", "Lee", "Nguyen", "Ali",
];

const MIN_AGE: usize = 18;
const MAX_AGE: usize = 57;

pub struct PersonaGenerator {
    picker: Arc<dyn ResponsePicker>,
}

impl PersonaGenerator {
    pub fn new(picker: Arc<dyn ResponsePicker>) -> Self {
        Self { picker }
    }

    /// 不重复地抽取 `count` 个下标（部分 Fisher-Yates 洗牌）
    fn sample_indices(&self, len: usize, count: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        let count = count.min(len);
        for i in 0..count {
            let j = i + self.picker.pick_index(len - i);
            indices.swap(i, j);
        }
        indices.truncate(count);
        indices
    }

    /// 抽取 3-5 项，西班牙语取相同下标
    fn sample_aligned(&self, en: &[String], es: &[String]) -> (Vec<String>, Vec<String>) {
        let count = self.picker.pick_in_range(3, 5);
        let picked = self.sample_indices(en.len(), count);
        let en_items = picked.iter().map(|&i| en[i].clone()).collect();
        let es_items = picked.iter().filter_map(|&i| es.get(i).cloned()).collect();
        (en_items, es_items)
    }

    fn pick_responses(
        &self,
        source: &[String],
        mirror: &[String],
        low: usize,
        high: usize,
    ) -> (Vec<String>, Vec<String>) {
        let count = self.picker.pick_in_range(low, high);
        let picked = self.sample_indices(source.len(), count);
        let en = picked.iter().map(|&i| source[i].clone()).collect();
        let mut es: Vec<String> = picked.iter().filter_map(|&i| mirror.get(i).cloned()).collect();
        if es.is_empty() {
            es = mirror.to_vec();
        }
        (en, es)
    }

    /// default 类别始终保留（3-5 条），另加 1-3 个类别，每个 2-4 条
    fn sample_banks(&self, template: &Persona) -> (ResponseBank, ResponseBank) {
        let (default_en, default_es) = self.pick_responses(
            template.responses.default_responses(),
            template.responses_es.default_responses(),
            3,
            5,
        );
        let mut responses = ResponseBank::new().with_category(DEFAULT_CATEGORY, default_en);
        let mut responses_es = ResponseBank::new().with_category(DEFAULT_CATEGORY, default_es);

        let extra: Vec<&String> = template
            .responses
            .categories()
            .map(|(category, _)| category)
            .filter(|category| category.as_str() != DEFAULT_CATEGORY)
            .collect();
        let wanted = self.picker.pick_in_range(1, 3);
        for index in self.sample_indices(extra.len(), wanted) {
            let category = extra[index];
            let mirror = template.responses_es.lookup(category);
            let (en, es) =
                self.pick_responses(template.responses.lookup(category), mirror, 2, 4);
            responses = responses.with_category(category, en);
            responses_es = responses_es.with_category(category, es);
        }

        (responses, responses_es)
    }

    /// 从模板中生成一个新病人
    pub fn generate(&self, templates: &[Persona]) -> Result<Persona> {
        let template = choose(self.picker.as_ref(), templates)
            .ok_or_else(|| AppError::Validation("no persona templates available".to_string()))?;

        let first = choose(self.picker.as_ref(), FIRST_NAMES).copied().unwrap_or("Alex");
        let last = choose(self.picker.as_ref(), LAST_NAMES).copied().unwrap_or("Doe");
        let age = self.picker.pick_in_range(MIN_AGE, MAX_AGE) as u32;

        let (symptoms, symptoms_es) = self.sample_aligned(&template.symptoms, &template.symptoms_es);
        let (triggers, triggers_es) = self.sample_aligned(&template.triggers, &template.triggers_es);
        let (approaches, approaches_es) = self.sample_aligned(
            &template.therapeutic_approaches,
            &template.therapeutic_approaches_es,
        );
        let (pitfalls, pitfalls_es) = self.sample_aligned(&template.pitfalls, &template.pitfalls_es);
        let (responses, responses_es) = self.sample_banks(template);

        let last_message = choose(self.picker.as_ref(), responses.default_responses())
            .cloned()
            .unwrap_or_default();
        let last_message_es = choose(self.picker.as_ref(), responses_es.default_responses())
            .cloned()
            .unwrap_or_default();

        Ok(Persona {
            id: format!("generated-{}", Uuid::now_v7()),
            name: format!("{} {}", first, last),
            age,
            condition: template.condition.clone(),
            condition_es: template.condition_es.clone(),
            last_message,
            last_message_es,
            symptoms,
            symptoms_es,
            triggers,
            triggers_es,
            therapeutic_approaches: approaches,
            therapeutic_approaches_es: approaches_es,
            pitfalls,
            pitfalls_es,
            background: None,
            responses,
            responses_es,
        })
    }
}
