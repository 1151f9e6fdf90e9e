use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Closed set of application states.
///
/// Transitions are unconstrained: any state may be written over any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Map a raw stored or user-supplied status string onto the closed set.
    ///
    /// Matching is case-insensitive. Exact names and their short stems
    /// (`accept`, `reject`, `pend`, `review`, `short`) match first; after that
    /// the stems are tried as substrings, so `"Under Review"` maps to
    /// `Reviewed`. Returns `None` for anything else.
    pub fn normalize(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }

        let exact = match s.as_str() {
            "pending" | "pend" => Some(ApplicationStatus::Pending),
            "reviewed" | "review" => Some(ApplicationStatus::Reviewed),
            "shortlisted" | "short" => Some(ApplicationStatus::Shortlisted),
            "accepted" | "accept" => Some(ApplicationStatus::Accepted),
            "rejected" | "reject" => Some(ApplicationStatus::Rejected),
            _ => None,
        };
        if exact.is_some() {
            return exact;
        }

        const FALLBACKS: [(&str, ApplicationStatus); 5] = [
            ("accept", ApplicationStatus::Accepted),
            ("reject", ApplicationStatus::Rejected),
            ("short", ApplicationStatus::Shortlisted),
            ("review", ApplicationStatus::Reviewed),
            ("pend", ApplicationStatus::Pending),
        ];
        FALLBACKS
            .iter()
            .find(|(stem, _)| s.contains(stem))
            .map(|(_, status)| *status)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student's application to a job.
///
/// `status` is the normalized value; it is `None` when the stored string could
/// not be mapped, in which case `raw_status` still carries what is on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,
    pub job_id: String,
    pub student_id: String,
    pub status: Option<ApplicationStatus>,
    pub raw_status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub job_id: String,
    pub student_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_exact_names_any_case() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::normalize(status.as_str()), Some(status));
            assert_eq!(
                ApplicationStatus::normalize(&status.as_str().to_uppercase()),
                Some(status)
            );
        }
        assert_eq!(
            ApplicationStatus::normalize("  Accepted "),
            Some(ApplicationStatus::Accepted)
        );
    }

    #[test]
    fn normalize_stems() {
        assert_eq!(
            ApplicationStatus::normalize("accept"),
            Some(ApplicationStatus::Accepted)
        );
        assert_eq!(
            ApplicationStatus::normalize("Reject"),
            Some(ApplicationStatus::Rejected)
        );
        assert_eq!(
            ApplicationStatus::normalize("pend"),
            Some(ApplicationStatus::Pending)
        );
        assert_eq!(
            ApplicationStatus::normalize("short"),
            Some(ApplicationStatus::Shortlisted)
        );
    }

    #[test]
    fn normalize_substring_fallbacks() {
        assert_eq!(
            ApplicationStatus::normalize("Under Review"),
            Some(ApplicationStatus::Reviewed)
        );
        assert_eq!(
            ApplicationStatus::normalize("short-listed"),
            Some(ApplicationStatus::Shortlisted)
        );
        assert_eq!(
            ApplicationStatus::normalize("Pending review"),
            Some(ApplicationStatus::Reviewed)
        );
        assert_eq!(
            ApplicationStatus::normalize("offer accepted!"),
            Some(ApplicationStatus::Accepted)
        );
    }

    #[test]
    fn normalize_unmapped() {
        assert_eq!(ApplicationStatus::normalize(""), None);
        assert_eq!(ApplicationStatus::normalize("   "), None);
        assert_eq!(ApplicationStatus::normalize("withdrawn"), None);
    }
}
