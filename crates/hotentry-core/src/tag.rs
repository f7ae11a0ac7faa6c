use serde::{Deserialize, Serialize};

/// Maximum length of a tag name, in characters.
pub const MAX_TAG_NAME_CHARS: usize = 255;

/// Normalizes a tag name: trims framing whitespace, lower-cases, and
/// truncates to [`MAX_TAG_NAME_CHARS`] characters.
///
/// Two names that differ only in case or framing whitespace normalize to
/// the same string. The result may be empty.
pub fn normalize_tag_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .take(MAX_TAG_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// A tag identified by its normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: normalize_tag_name(name),
        }
    }
}

/// A weighted association between an entry and a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagging {
    pub tag_id: i64,
    pub tag_name: String,
    pub score: i32,
}

/// Number of entries carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

/// Orders taggings by score, highest first, then by name.
pub fn sort_taggings(taggings: &mut [Tagging]) {
    taggings.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.tag_name.cmp(&b.tag_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_whitespace_collapse() {
        assert_eq!(normalize_tag_name("  GoLang "), "golang");
        assert_eq!(normalize_tag_name("golang"), normalize_tag_name("GOLANG\t"));
    }

    #[test]
    fn blank_names_normalize_to_empty() {
        assert_eq!(normalize_tag_name("   "), "");
        assert_eq!(normalize_tag_name(""), "");
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let raw = "あ".repeat(300);
        let name = normalize_tag_name(&raw);
        assert_eq!(name.chars().count(), MAX_TAG_NAME_CHARS);
    }

    #[test]
    fn tag_new_normalizes() {
        assert_eq!(Tag::new(1, " Rust ").name, "rust");
    }

    #[test]
    fn taggings_sort_by_score_then_name() {
        let mut taggings = vec![
            Tagging {
                tag_id: 1,
                tag_name: "b".into(),
                score: 1,
            },
            Tagging {
                tag_id: 2,
                tag_name: "a".into(),
                score: 1,
            },
            Tagging {
                tag_id: 3,
                tag_name: "c".into(),
                score: 9,
            },
        ];
        sort_taggings(&mut taggings);

        let names: Vec<_> = taggings.iter().map(|t| t.tag_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
