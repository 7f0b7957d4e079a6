use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two ledger categories a video can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LongForm,
    ShortForm,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::LongForm, Category::ShortForm];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::LongForm => write!(f, "long-form"),
            Category::ShortForm => write!(f, "short-form"),
        }
    }
}

/// A named fixed cost charged against every video of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRule {
    pub role: String,
    pub value: Decimal,
}

impl CostRule {
    #[must_use]
    pub fn new(role: impl Into<String>, value: Decimal) -> Self {
        Self {
            role: role.into(),
            value,
        }
    }
}

/// Video metadata as returned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub duration_seconds: u64,
    pub view_count: u64,
}

impl VideoRecord {
    /// Canonical watch URL, used as the ledger dedup key.
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }

    #[must_use]
    pub fn category(&self) -> Category {
        crate::duration::classify_duration(self.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn video(id: &str, duration_seconds: u64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            title: "t".to_string(),
            duration_seconds,
            view_count: 0,
        }
    }

    #[test]
    fn watch_url_is_derived_from_id() {
        assert_eq!(
            video("abc123", 10).watch_url(),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn category_follows_duration() {
        assert_eq!(video("a", 65).category(), Category::ShortForm);
        assert_eq!(video("a", 66).category(), Category::LongForm);
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::LongForm.to_string(), "long-form");
        assert_eq!(Category::ShortForm.to_string(), "short-form");
    }
}
