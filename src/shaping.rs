//! Turns fetched submissions into labeled text rows.

use serde::{Deserialize, Serialize};

use crate::{batch::ResultSet, record::Record};

/// Placeholder the API returns for moderator-removed post bodies.
pub const REMOVED_MARKER: &str = "[removed]";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostLabel {
    News,
    Conspiracy,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LabeledPost {
    pub text: String,
    pub news: u8,
    pub conspiracy: u8,
}

impl LabeledPost {
    pub fn new(text: String, label: PostLabel) -> Self {
        let (news, conspiracy) = match label {
            PostLabel::News => (1, 0),
            PostLabel::Conspiracy => (0, 1),
        };

        Self {
            text,
            news,
            conspiracy,
        }
    }
}

/// Text of the record if it carries a real body. Missing, non-string, blank
/// and removed bodies yield `None`.
pub fn usable_text<'a>(record: &'a Record, text_field: &str) -> Option<&'a str> {
    record
        .get_str(text_field)
        .filter(|text| !text.is_empty() && *text != REMOVED_MARKER)
}

pub fn label_posts(result: &ResultSet, text_field: &str, label: PostLabel) -> Vec<LabeledPost> {
    result
        .iter()
        .filter_map(|record| usable_text(record, text_field))
        .map(|text| LabeledPost::new(text.to_string(), label))
        .collect()
}
