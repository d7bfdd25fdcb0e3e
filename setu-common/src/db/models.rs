//! Database models shared across services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Implements `as_str`, `Display` and `FromStr` for a closed string enum
/// stored in a TEXT column.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::Decode(format!(
                        "Unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Worker,
    Family,
}

text_enum!(ProfileType {
    Worker => "worker",
    Family => "family",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Ne,
}

text_enum!(Language {
    En => "en",
    Ne => "ne",
});

/// A user as seen by Setu services (identity is provisioned externally)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_type: ProfileType,
    pub language_preference: Language,
    /// For family members: the worker whose activity they follow
    pub monitored_worker_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Safety,
    Reminder,
    Community,
    Contract,
    Document,
    General,
}

text_enum!(NotificationCategory {
    Safety => "safety",
    Reminder => "reminder",
    Community => "community",
    Contract => "contract",
    Document => "document",
    General => "general",
});

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub category: NotificationCategory,
    pub title: String,
    pub description: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventType {
    CheckIn,
    Arrived,
    Contract,
    Document,
    Sos,
    Other,
}

text_enum!(ActivityEventType {
    CheckIn => "check_in",
    Arrived => "arrived",
    Contract => "contract",
    Document => "document",
    Sos => "sos",
    Other => "other",
});

/// Activity entry visible on the family dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: i64,
    pub event_type: ActivityEventType,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}
