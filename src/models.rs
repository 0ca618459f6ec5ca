use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A to-do item as persisted by the remote task service.
///
/// Everything except `complete` is fixed once the service has assigned the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "instant")]
    pub created: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "optional_instant",
        skip_serializing_if = "Option::is_none"
    )]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub complete: bool,
}

impl Task {
    /// The deadline used for proximity display: `due`, or `created` when unset.
    pub fn effective_due(&self) -> DateTime<Utc> {
        self.due.unwrap_or(self.created)
    }

    pub fn due_state(&self, now: DateTime<Utc>) -> DueState {
        if self.complete {
            return DueState::Normal;
        }
        let due = self.effective_due();
        if due < now {
            DueState::Overdue
        } else if due - now <= Duration::days(DUE_SOON_DAYS) {
            DueState::Warning
        } else {
            DueState::Normal
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.complete {
            "Completed"
        } else {
            "In Progress"
        }
    }
}

const DUE_SOON_DAYS: i64 = 7;

/// Deadline proximity of a task relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Normal,
    Warning,
    Overdue,
}

impl DueState {
    pub fn css_class(self) -> &'static str {
        match self {
            DueState::Normal => "due",
            DueState::Warning => "due warning",
            DueState::Overdue => "due overdue",
        }
    }
}

/// User input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskDto {
    pub title: String,
    pub description: String,
    pub due: Option<NaiveDate>,
}

/// Creation payload sent to the service: the dto plus the client-filled
/// `created` timestamp and `complete = false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    pub created: DateTime<Utc>,
    pub complete: bool,
}

impl NewTask {
    pub fn from_dto(dto: CreateTaskDto, created: DateTime<Utc>) -> Self {
        Self {
            title: dto.title,
            description: dto.description,
            due: dto.due,
            created,
            complete: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    InProgress,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 2] = [StatusFilter::InProgress, StatusFilter::Completed];

    pub fn key(self) -> &'static str {
        match self {
            StatusFilter::InProgress => "inprogress",
            StatusFilter::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::InProgress => "In Progress",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::InProgress => !task.complete,
            StatusFilter::Completed => task.complete,
        }
    }
}

/// Inclusive bounds on a task's `created` instant. A missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < midnight_utc(start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if instant > midnight_utc(end) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Start,
    End,
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Parses a timestamp as either RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(midnight_utc)
}

/// Parses an optional form date; an empty field means "no date".
pub fn parse_date_field(value: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map(Some)
}

fn instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`")))
}

fn optional_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_instant(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`"))),
    }
}
