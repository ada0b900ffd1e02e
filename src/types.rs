//! Core types for the Sharpei task tracker.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Task priority tier. Lower numbers sort first.
pub type Priority = i32;

/// Priority constants for convenience.
pub const PRIORITY_HIGH: Priority = 0;
pub const PRIORITY_NORMAL: Priority = 1;
pub const PRIORITY_LOW: Priority = 2;
pub const PRIORITY_DEFAULT: Priority = PRIORITY_NORMAL;

/// Whether `p` is one of the three known tiers.
pub fn is_valid_priority(p: Priority) -> bool {
    (PRIORITY_HIGH..=PRIORITY_LOW).contains(&p)
}

/// Parse a priority from a label ("high", "normal", "low") or a tier number.
/// Returns `None` for anything that is not a known tier.
pub fn parse_priority(s: &str) -> Option<Priority> {
    let p = match s.trim().to_lowercase().as_str() {
        "high" => PRIORITY_HIGH,
        "normal" | "medium" => PRIORITY_NORMAL,
        "low" => PRIORITY_LOW,
        other => other.parse().ok()?,
    };
    is_valid_priority(p).then_some(p)
}

/// Human-readable label for a priority tier. Unknown tiers read as "Normal".
pub fn priority_label(p: Priority) -> &'static str {
    match p {
        PRIORITY_HIGH => "High",
        PRIORITY_LOW => "Low",
        _ => "Normal",
    }
}

/// Parse due-date text into a timestamp.
///
/// Accepts RFC 3339 (offsets are normalized to UTC), a naive
/// `YYYY-MM-DDTHH:MM[:SS[.f]]` (a space separator also works), or a bare
/// `YYYY-MM-DD`, which becomes midnight.
pub fn parse_due_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A task category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A task row.
///
/// Subtasks are not stored on the task itself; they are derived by querying
/// for rows whose `parent_id` is this task's id (see [`TaskTree`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub priority: Priority,
    pub position: i64,
    pub hashtags: Option<String>,
    pub completed: bool,
    pub archived: bool,
    pub category_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task with its live subtask tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<TaskTree>,
}

impl TaskTree {
    /// Total number of tasks in this tree, including the root.
    pub fn count(&self) -> usize {
        1 + self.subtasks.iter().map(TaskTree::count).sum::<usize>()
    }
}

/// Input for creating a task.
///
/// There is no `position` field: positions are always assigned at creation
/// time, and a `position` key in loosely-typed input is dropped here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "due_date_opt")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub hashtags: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hashtags(mut self, hashtags: impl Into<String>) -> Self {
        self.hashtags = Some(hashtags.into());
        self
    }
}

/// Sparse update for a task.
///
/// The outer `Option` says whether a field is present in the patch. For
/// nullable columns the inner `Option` carries the new value, where `None`
/// clears the column. Non-nullable fields (`title`, `priority`, `position`,
/// `completed`, `archived`) treat an explicit null as "no change".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "due_date_patch")]
    pub due_date: Option<Option<NaiveDateTime>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub hashtags: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

impl TaskPatch {
    /// True if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// Filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default, alias = "q")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub show_archived: bool,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// The search term, if one is set and non-empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// Deserialize a present field (even `null`) as `Some(value)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accept a JSON bool or the usual query-string spellings
/// (`1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`).
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientBool;

    impl serde::de::Visitor<'_> for LenientBool {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a boolean or one of 1/0, true/false, yes/no, on/off")
        }

        fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(serde::de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(serde::de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(E::invalid_value(serde::de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(LenientBool)
}

fn due_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_due_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid due_date: {}", s))),
    }
}

fn due_date_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    due_date_opt(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_show_archived_accepts_query_spellings() {
        for (raw, expected) in [
            (json!(true), true),
            (json!("1"), true),
            (json!("yes"), true),
            (json!("ON"), true),
            (json!(1), true),
            (json!("0"), false),
            (json!("off"), false),
            (json!(false), false),
        ] {
            let filter: TaskFilter =
                serde_json::from_value(json!({ "show_archived": raw })).unwrap();
            assert_eq!(filter.show_archived, expected, "input {}", raw);
        }

        assert!(serde_json::from_value::<TaskFilter>(json!({ "show_archived": "maybe" })).is_err());
        let filter: TaskFilter = serde_json::from_value(json!({})).unwrap();
        assert!(!filter.show_archived);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("high"), Some(PRIORITY_HIGH));
        assert_eq!(parse_priority("Normal"), Some(PRIORITY_NORMAL));
        assert_eq!(parse_priority(" LOW "), Some(PRIORITY_LOW));
        assert_eq!(parse_priority("0"), Some(0));
        assert_eq!(parse_priority("2"), Some(2));
        assert_eq!(parse_priority("3"), None);
        assert_eq!(parse_priority("urgent"), None);
    }

    #[test]
    fn test_priority_label() {
        assert_eq!(priority_label(0), "High");
        assert_eq!(priority_label(1), "Normal");
        assert_eq!(priority_label(2), "Low");
        assert_eq!(priority_label(7), "Normal");
    }

    #[test]
    fn test_parse_due_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2025, 2, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let noon = NaiveDate::from_ymd_opt(2025, 2, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        assert_eq!(parse_due_date("2025-02-15"), Some(midnight));
        assert_eq!(parse_due_date("2025-02-15T12:00:00"), Some(noon));
        assert_eq!(parse_due_date("2025-02-15T12:00"), Some(noon));
        assert_eq!(parse_due_date("2025-02-15 12:00:00"), Some(noon));
        assert_eq!(parse_due_date("2025-02-15T12:00:00Z"), Some(noon));
        assert_eq!(parse_due_date("2025-02-15T14:00:00+02:00"), Some(noon));
        assert_eq!(parse_due_date("next tuesday"), None);
        assert_eq!(parse_due_date("2025-13-01"), None);
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: TaskPatch = serde_json::from_value(json!({
            "description": null,
            "category_id": 4,
            "position": null,
            "not_a_field": "ignored"
        }))
        .unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.category_id, Some(Some(4)));
        assert_eq!(patch.position, None);
        assert_eq!(patch.hashtags, None);
        assert_eq!(patch.parent_id, None);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_due_date_text() {
        let patch: TaskPatch =
            serde_json::from_value(json!({ "due_date": "2025-03-01" })).unwrap();
        assert_eq!(
            patch.due_date,
            Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0))
        );

        let cleared: TaskPatch = serde_json::from_value(json!({ "due_date": "" })).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let bad = serde_json::from_value::<TaskPatch>(json!({ "due_date": "soon" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_empty_patch() {
        let patch: TaskPatch = serde_json::from_value(json!({ "position": null })).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_new_task_drops_position() {
        let new: NewTask = serde_json::from_value(json!({
            "title": "Write report",
            "position": 99,
            "priority": 0
        }))
        .unwrap();
        assert_eq!(new.title, "Write report");
        assert_eq!(new.priority, Some(0));
        assert!(!new.completed);
    }

    #[test]
    fn test_filter_search_term() {
        let mut filter = TaskFilter::default();
        assert_eq!(filter.search_term(), None);
        filter.search = Some(String::new());
        assert_eq!(filter.search_term(), None);
        filter.search = Some("buy".into());
        assert_eq!(filter.search_term(), Some("buy"));
    }
}
