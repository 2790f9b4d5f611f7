//! 书籍文本分块与病症识别

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::knowledge::KnowledgeEntry;

/// 章节起始行：`Chapter`、`<数字>.` 或 `Section`
static SECTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Chapter|\d+\.|Section)").expect("valid section regex"));

/// 章节标题：起始标记后跟空白和标题文字
static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Chapter|\d+\.|Section)\s+\S.*").expect("valid header regex")
});

/// 可识别的心理障碍
pub const KNOWN_CONDITIONS: &[&str] = &[
    "Depression",
    "Anxiety",
    "PTSD",
    "Bipolar Disorder",
    "Schizophrenia",
    "OCD",
    "ADHD",
    "Eating Disorders",
    "Personality Disorders",
    "Substance Use Disorders",
];

const BASE_TAGS: &[&str] = &["psychology", "disorder"];

/// 分块结果
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub chapter: String,
    /// 块序号（从 1 开始），近似页码
    pub ordinal: u32,
}

/// 在章节起始行之前切分文本
///
/// 切分后逐块去除首尾空白，短于 `min_chars` 的块被丢弃，但序号照常递增。
pub fn split_sections(text: &str, min_chars: usize) -> Vec<TextChunk> {
    let mut raw: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, line) in text.lines().enumerate() {
        if i > 0 && SECTION_START.is_match(line) {
            raw.push(std::mem::take(&mut current));
        } else if i > 0 {
            current.push('\n');
        }
        current.push_str(line);
    }
    raw.push(current);

    raw.iter()
        .enumerate()
        .filter_map(|(i, chunk)| {
            let chunk = chunk.trim();
            if chunk.chars().count() < min_chars {
                return None;
            }
            let ordinal = (i + 1) as u32;
            let first_line = chunk.lines().next().unwrap_or_default();
            let chapter = match SECTION_HEADER.find(first_line) {
                Some(header) => header.as_str().trim().to_string(),
                None => format!("Section {}", ordinal),
            };
            Some(TextChunk {
                text: chunk.to_string(),
                chapter,
                ordinal,
            })
        })
        .collect()
}

/// 文本中提到的病症（不区分大小写的子串匹配）
pub fn detect_conditions(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KNOWN_CONDITIONS
        .iter()
        .filter(|condition| lower.contains(&condition.to_lowercase()))
        .map(|condition| condition.to_string())
        .collect()
}

/// 把一本书的文本转换为知识条目
pub fn build_entries(source: &str, text: &str, min_chars: usize) -> Vec<KnowledgeEntry> {
    split_sections(text, min_chars)
        .into_iter()
        .map(|chunk| {
            let conditions = detect_conditions(&chunk.text);
            let mut tags = conditions.clone();
            tags.extend(BASE_TAGS.iter().map(|t| t.to_string()));
            KnowledgeEntry {
                text: chunk.text,
                source: source.to_string(),
                page: chunk.ordinal,
                chapter: chunk.chapter,
                condition: conditions.join(", "),
                tags,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BOOK: &str = "Preface text that is too short.\n\
Chapter 1 Understanding Anxiety\n\
Anxiety often shows up as worry about the future and physical tension in the body.\n\
Chapter 2 Living with Depression\n\
Depression and Anxiety frequently co-occur; patients describe low mood and fatigue.\n\
12. Trauma\n\
PTSD symptoms include flashbacks, hypervigilance and avoidance of reminders.";

    #[test]
    fn test_split_before_section_headers() {
        let chunks = split_sections(BOOK, 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chapter, "Chapter 1 Understanding Anxiety");
        assert_eq!(chunks[0].ordinal, 2);
        assert_eq!(chunks[2].chapter, "12. Trauma");
        assert!(chunks[1].text.starts_with("Chapter 2"));
    }

    #[test]
    fn test_unlabelled_chunk_gets_section_number() {
        let text = "A long introduction without any heading, long enough to be kept as a chunk.";
        let chunks = split_sections(text, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chapter, "Section 1");
    }

    #[test]
    fn test_short_chunks_are_dropped() {
        assert!(split_sections("Chapter 1\nshort", 50).is_empty());
        assert!(split_sections("   \n  ", 1).is_empty());
    }

    #[rstest]
    #[case("Living with depression and ANXIETY", vec!["Depression", "Anxiety"])]
    #[case("Children with ADHD and OCD", vec!["OCD", "ADHD"])]
    #[case("Nothing clinical here", vec![])]
    fn test_detect_conditions(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(detect_conditions(text), expected);
    }

    #[test]
    fn test_build_entries_metadata() {
        let entries = build_entries("handbook", BOOK, 50);
        assert_eq!(entries.len(), 3);
        let second = &entries[1];
        assert_eq!(second.source, "handbook");
        assert_eq!(second.page, 3);
        assert_eq!(second.condition, "Depression, Anxiety");
        assert_eq!(
            second.tags,
            vec!["Depression", "Anxiety", "psychology", "disorder"]
        );
        assert_eq!(entries[2].condition, "PTSD");
    }
}
