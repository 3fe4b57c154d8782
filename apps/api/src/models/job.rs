use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Application pipeline stage. Stored and serialized with the Turkish labels the
/// web client displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "Yeni")]
    New,
    #[serde(rename = "Başvuruldu")]
    Applied,
    #[serde(rename = "Mülakat")]
    Interview,
    #[serde(rename = "Reddedildi")]
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "Yeni",
            JobStatus::Applied => "Başvuruldu",
            JobStatus::Interview => "Mülakat",
            JobStatus::Rejected => "Reddedildi",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub status: String,
    pub score: Option<i64>,
    pub motivation_letter: Option<String>,
    pub summary_tr: Option<String>,
    pub language_reqs: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_match_serde() {
        for status in [
            JobStatus::New,
            JobStatus::Applied,
            JobStatus::Interview,
            JobStatus::Rejected,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<JobStatus>(r#""Archived""#).is_err());
    }
}
