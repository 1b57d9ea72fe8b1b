use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Fallback text for records with missing fields.
pub const NO_SUBJECT: &str = "No Subject";
pub const NO_DESCRIPTION: &str = "No Description";
pub const NO_START_DATE: &str = "No Start Date";
pub const NO_END_DATE: &str = "No End Date";

/// A single scheduled activity as supplied by the host dataset.
///
/// Records are read-only input: the control renders them but never
/// mutates or persists them. Missing fields are tolerated everywhere and
/// substituted with placeholder text at render time.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ActivityRecord {
    /// Host record id; datasets without ids get a generated one
    #[serde(default = "generate_record_id")]
    pub id: String,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Scheduled start; grouping keys derive from this date
    #[serde(default, alias = "scheduledstart", with = "lenient_datetime")]
    pub scheduled_start: Option<NaiveDateTime>,

    #[serde(default, alias = "scheduledend", with = "lenient_datetime")]
    pub scheduled_end: Option<NaiveDateTime>,

    /// Raw status code from the host; unknown codes render neutrally
    #[serde(default, alias = "statuscode")]
    pub status_code: i64,
}

impl ActivityRecord {
    pub fn new(
        subject: Option<String>,
        description: Option<String>,
        scheduled_start: Option<NaiveDateTime>,
        scheduled_end: Option<NaiveDateTime>,
        status_code: i64,
    ) -> Self {
        Self {
            id: generate_record_id(),
            subject,
            description,
            scheduled_start,
            scheduled_end,
            status_code,
        }
    }

    pub fn status(&self) -> ActivityStatus {
        ActivityStatus::from_code(self.status_code)
    }

    pub fn display_subject(&self) -> &str {
        non_empty(self.subject.as_deref()).unwrap_or(NO_SUBJECT)
    }

    pub fn display_description(&self) -> &str {
        non_empty(self.description.as_deref()).unwrap_or(NO_DESCRIPTION)
    }

    pub fn display_start(&self) -> String {
        self.scheduled_start
            .map(format_datetime)
            .unwrap_or_else(|| NO_START_DATE.to_string())
    }

    pub fn display_end(&self) -> String {
        self.scheduled_end
            .map(format_datetime)
            .unwrap_or_else(|| NO_END_DATE.to_string())
    }
}

/// Activity status derived from the dataset's raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Default,
    Completed,
    InProgress,
    Canceled,
}

impl ActivityStatus {
    /// Map a raw status code; anything outside the known set is Default.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ActivityStatus::Completed,
            2 => ActivityStatus::InProgress,
            3 => ActivityStatus::Canceled,
            _ => ActivityStatus::Default,
        }
    }

    /// Left-border marker color for an activity item.
    pub fn color(self) -> &'static str {
        match self {
            ActivityStatus::Completed => "#28a745",
            ActivityStatus::InProgress => "#ffc107",
            ActivityStatus::Canceled => "#dc3545",
            ActivityStatus::Default => "#6c757d",
        }
    }
}

fn generate_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Parse a date value the way host datasets format them.
///
/// Accepts RFC 3339 seconds, `YYYY-MM-DD HH:MM[:SS]`, or a bare date.
/// Anything unparseable becomes `None` so the record degrades to the
/// invalid-date group instead of failing the load.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// serde adapter for the lenient datetime fields above
mod lenient_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_datetime))
    }
}
