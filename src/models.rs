// src/models.rs

use crate::notifier::CourseRefreshNotifier;
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

// --- App State ---

pub struct AppState {
    pub db: Mutex<Connection>,
    pub notifier: CourseRefreshNotifier,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Mutex::new(conn),
            notifier: CourseRefreshNotifier::new(),
        }
    }
}

/// Epoch milliseconds, the unit every timestamp column uses.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// --- Text-backed enums ---

/// Enums stored as TEXT columns using the same spelling serde uses.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Connected,
    InSession,
}

text_enum!(MatchStatus {
    Pending => "pending",
    Accepted => "accepted",
    Connected => "connected",
    InSession => "in_session",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

text_enum!(RequestStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Chat,
    Video,
    Files,
}

text_enum!(SessionMode {
    Chat => "chat",
    Video => "video",
    Files => "files",
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

text_enum!(CourseLevel {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
    Expert => "Expert",
});

// --- Profiles ---

/// Trims, lower-cases and de-duplicates free-text skill labels; blanks are dropped.
pub fn normalize_skills<I, S>(skills: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    skills
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub skills_have: BTreeSet<String>,
    #[serde(default)]
    pub skills_to_learn: BTreeSet<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        UserProfile {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_skills<H, L>(mut self, have: H, to_learn: L) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        self.skills_have = normalize_skills(have);
        self.skills_to_learn = normalize_skills(to_learn);
        self
    }
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub skills_have: Option<Vec<String>>,
    pub skills_to_learn: Option<Vec<String>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PotentialMatch {
    pub candidate: UserProfile,
    pub common_skills_have: Vec<String>,
    pub common_skills_to_learn: Vec<String>,
    pub match_score: usize,
}

// --- Courses ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Lesson {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub is_preview: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: String,
    pub instructor_id: String,
    pub title: String,
    pub description: String,
    pub level: CourseLevel,
    pub duration: String,
    pub is_public: bool,
    pub tags: BTreeSet<String>,
    pub sections: Vec<Section>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Course {
    pub fn total_lessons(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    pub fn lesson_at(&self, section: u32, lesson: u32) -> Option<&Lesson> {
        self.sections
            .get(section as usize)
            .and_then(|s| s.lessons.get(lesson as usize))
    }
}

/// What an instructor submits when creating (`id: None`) or editing a course.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CourseDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CourseListing {
    #[serde(flatten)]
    pub course: Course,
    pub instructor_name: String,
    pub instructor_bio: String,
    pub from_connection: bool,
}

// --- Connections ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub users: [String; 2],
    pub status: MatchStatus,
    pub session_mode: Option<SessionMode>,
    pub last_session_at: Option<i64>,
    pub total_sessions: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Match {
    pub fn involves(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }

    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        match &self.users {
            [a, b] if a == user_id => Some(b.as_str()),
            [a, b] if b == user_id => Some(a.as_str()),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    pub status: RequestStatus,
    pub read: bool,
    pub match_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A pending request as shown to its target, with the requester's profile summary.
#[derive(Serialize, Debug, Clone)]
pub struct IncomingRequest {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub requester_name: String,
    pub requester_skills_have: BTreeSet<String>,
    pub requester_skills_to_learn: BTreeSet<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub match_id: String,
    pub sender_id: String,
    pub body: String,
    pub kind: String,
    pub sent_at: i64,
}

// --- Progress ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CourseProgress {
    pub user_id: String,
    pub course_id: String,
    pub completed_lessons: BTreeSet<String>,
    pub current_section: u32,
    pub current_lesson: u32,
    pub total_lessons: Option<i64>,
    pub updated_at: i64,
}

impl CourseProgress {
    pub fn new(user_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        CourseProgress {
            user_id: user_id.into(),
            course_id: course_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ProgressSummary {
    #[serde(flatten)]
    pub progress: CourseProgress,
    pub percentage: u32,
    pub is_completed: bool,
}
