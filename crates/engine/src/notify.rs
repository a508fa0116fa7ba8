//! User-facing notifications raised by the editing session.

use chrono::{DateTime, Utc};
use sacco_types::Section;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    /// Section the message is about; `None` for application-wide messages.
    pub section: Option<Section>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(section: Option<Section>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, section, message.into())
    }

    pub fn error(section: Option<Section>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, section, message.into())
    }

    fn new(level: NotificationLevel, section: Option<Section>, message: String) -> Self {
        match level {
            NotificationLevel::Success => info!(section = ?section, "{}", message),
            NotificationLevel::Error => warn!(section = ?section, "{}", message),
        }
        Self {
            level,
            section,
            message,
            created_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = match self.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Error => "✗",
        };
        write!(f, "{} {}", marker, self.message)
    }
}
