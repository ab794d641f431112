use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─── Events ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Class,
    Homework,
    Exam,
    #[default]
    #[serde(other)]
    Other,
}

impl EventType {
    pub fn next(self) -> Self {
        match self {
            Self::Class => Self::Homework,
            Self::Homework => Self::Exam,
            Self::Exam => Self::Other,
            Self::Other => Self::Class,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
    /// Also what unrecognised frequencies decode to.
    #[default]
    #[serde(other)]
    Weekly,
}

impl Frequency {
    pub fn next(self) -> Self {
        match self {
            Self::Daily => Self::Weekly,
            Self::Weekly => Self::Monthly,
            Self::Monthly => Self::Daily,
        }
    }
}

/// Forwarded verbatim to the server, which owns recurrence expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// 0 = Sunday, 1 = Monday, ... 6 = Saturday.
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default = "default_interval", deserialize_with = "interval_or_default")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

/// `null` is stored by the server for patterns saved without an interval.
fn interval_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or_else(default_interval))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub course: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub instructor: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// Longer than one day: shown in the week row instead of a day cell.
    pub fn is_week_long(&self) -> bool {
        self.duration() > chrono::Duration::days(1)
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            course: self.course.clone(),
            event_type: self.event_type,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location.clone(),
            instructor: self.instructor.clone(),
            priority: self.priority,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern.clone(),
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

/// Body of `POST /api/events` and `PUT /api/events/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub course: Option<String>,
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub instructor: Option<String>,
    pub priority: Priority,
    pub is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl EventDraft {
    /// A one-line event with the defaults used by the quick-add prompts.
    pub fn simple(
        title: String,
        notes: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            title,
            description: Some(notes),
            course: None,
            event_type: EventType::Other,
            start_time,
            end_time,
            location: None,
            instructor: None,
            priority: Priority::Medium,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
        }
    }
}

// ─── Files & Notes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFile {
    pub id: Uuid,
    pub original_filename: String,
    pub file_size: u64,
    pub uploaded_by: String,
    pub mime_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNote {
    pub id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub author_name: String,
    pub content: String,
}

/// Response of `GET /api/events/:id/details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    #[serde(default)]
    pub files: Vec<EventFile>,
    #[serde(default)]
    pub notes: Vec<EventNote>,
}

// ─── Envelope ───────────────────────────────────────────────────────────────

/// `{success, data?, message?}` wrapper used by every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}
