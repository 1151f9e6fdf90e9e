use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Types of notifications a user can receive. The type decides where a click
/// on the notification leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewJob,
    ApplicationStatus,
    NewMessage,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewJob => "new_job",
            NotificationType::ApplicationStatus => "application_status",
            NotificationType::NewMessage => "new_message",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_job" => Ok(NotificationType::NewJob),
            "application_status" => Ok(NotificationType::ApplicationStatus),
            "new_message" => Ok(NotificationType::NewMessage),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// One notification document as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Assigned by the store on creation
    pub id: String,
    /// Recipient
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Only set for `new_job` notifications
    pub job_id: Option<String>,
    /// Assigned by the store on creation; the only sort key
    pub timestamp: NaiveDateTime,
    pub read: bool,
}

/// Content identity of a notification. Records with equal keys are
/// duplicates regardless of id or timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    pub message: String,
    pub job_id: Option<String>,
}

impl NotificationRecord {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            title: self.title.clone(),
            message: self.message.clone(),
            job_id: self.job_id.clone(),
        }
    }

    /// Leftovers from manual testing: "test" anywhere in the title or message
    /// (any case), or a blank message.
    pub fn is_test_data(&self) -> bool {
        let title = self.title.to_lowercase();
        let message = self.message.to_lowercase();
        title.contains("test") || message.contains("test") || self.message.trim().is_empty()
    }
}

/// Data required to create a notification. `id` and `timestamp` are assigned
/// by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub job_id: Option<String>,
}

impl CreateNotification {
    /// Check required fields. Runs before any store call.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("notification recipient is required".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("notification title is required".to_string());
        }
        match (self.notification_type, self.job_id.as_deref()) {
            (NotificationType::NewJob, None) => {
                Err("new_job notifications require a job id".to_string())
            }
            (NotificationType::NewJob, Some(job_id)) if job_id.trim().is_empty() => {
                Err("new_job notifications require a job id".to_string())
            }
            (NotificationType::NewJob, Some(_)) => Ok(()),
            (other, Some(_)) => Err(format!("{} notifications cannot carry a job id", other)),
            (_, None) => Ok(()),
        }
    }
}

/// Field update applied by `NotificationStore::update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPatch {
    pub read: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(title: &str, message: &str) -> NotificationRecord {
        NotificationRecord {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            title: title.to_string(),
            message: message.to_string(),
            notification_type: NotificationType::NewMessage,
            job_id: None,
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
            read: false,
        }
    }

    #[test]
    fn test_data_heuristic() {
        assert!(record("TEST job", "hello").is_test_data());
        assert!(record("Job", "this is a Test").is_test_data());
        assert!(record("Job", "   ").is_test_data());
        assert!(record("Job", "").is_test_data());
        assert!(record("Contest winners", "hello").is_test_data());
        assert!(!record("New job", "Acme posted a role").is_test_data());
    }

    #[test]
    fn dedup_key_ignores_id_and_timestamp() {
        let a = record("Job1", "New job");
        let mut b = a.clone();
        b.id = "n2".to_string();
        b.timestamp = b.timestamp + chrono::Duration::seconds(30);
        b.read = true;
        assert_eq!(a.dedup_key(), b.dedup_key());

        b.job_id = Some("j1".to_string());
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn validate_job_id_rules() {
        let mut n = CreateNotification {
            user_id: "u1".to_string(),
            title: "New job".to_string(),
            message: "Acme is hiring".to_string(),
            notification_type: NotificationType::NewJob,
            job_id: None,
        };
        assert!(n.validate().is_err());

        n.job_id = Some("j1".to_string());
        assert!(n.validate().is_ok());

        n.notification_type = NotificationType::NewMessage;
        assert!(n.validate().is_err());

        n.job_id = None;
        assert!(n.validate().is_ok());

        n.title = "  ".to_string();
        assert!(n.validate().is_err());
    }

    #[test]
    fn notification_type_round_trips_through_str() {
        for t in [
            NotificationType::NewJob,
            NotificationType::ApplicationStatus,
            NotificationType::NewMessage,
        ] {
            assert_eq!(t.as_str().parse::<NotificationType>(), Ok(t));
        }
        assert!("stream_online".parse::<NotificationType>().is_err());
    }
}
