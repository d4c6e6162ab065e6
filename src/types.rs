use serde::{Deserialize, Serialize};

/// Upper bound on the number of tags kept per log line.
pub const MAX_TAGS: usize = 3;

/// A single non-empty input line with its run-wide id (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogItem {
    pub id: u64,
    pub text: String,
}

impl LogItem {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// One element of the list returned by the model, before it is merged with
/// the source line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEntry {
    pub log_id: u64,
    #[serde(alias = "etiquetas")]
    pub tags: Vec<String>,
}

/// A tagged log line as written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub log_id: u64,
    pub text: String,
    pub tags: Vec<String>,
}

impl Classification {
    pub fn merge(item: &LogItem, entry: RawEntry) -> Self {
        let mut tags = entry.tags;
        tags.truncate(MAX_TAGS);
        Self {
            log_id: item.id,
            text: item.text.clone(),
            tags,
        }
    }
}

/// Why a run stopped without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InputExhausted,
    DailyQuotaReached,
    QuotaRejected,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::InputExhausted => "input exhausted",
            StopReason::DailyQuotaReached => "daily request quota reached",
            StopReason::QuotaRejected => "quota exceeded by remote",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_original_text_and_caps_tags() {
        let item = LogItem::new(4, "disk /dev/sda1 at 97%");
        let entry = RawEntry {
            log_id: 4,
            tags: vec![
                "storage capacity".into(),
                "resource exhaustion".into(),
                "monitoring".into(),
                "filesystem".into(),
            ],
        };

        let merged = Classification::merge(&item, entry);
        assert_eq!(merged.log_id, 4);
        assert_eq!(merged.text, "disk /dev/sda1 at 97%");
        assert_eq!(
            merged.tags,
            vec!["storage capacity", "resource exhaustion", "monitoring"]
        );
    }

    #[test]
    fn raw_entry_accepts_spanish_tag_field() {
        let entry: RawEntry =
            serde_json::from_str(r#"{"log_id": 2, "texto": "x", "etiquetas": ["auth"]}"#).unwrap();
        assert_eq!(entry.log_id, 2);
        assert_eq!(entry.tags, vec!["auth"]);
    }
}
