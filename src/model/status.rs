use serde::{Deserialize, Serialize};

use crate::model::DatabaseError;

/// Per-user state of one subtopic. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for ProgressStatus {
    type Error = DatabaseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(DatabaseError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic state as seen by one user, derived from subtopic progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Locked,
    Available,
    Completed,
}

impl TopicStatus {
    /// Statuses for topics in order, given whether each topic is fully
    /// completed. The first topic and every topic after a completed one are
    /// available.
    pub fn derive(completed: &[bool]) -> Vec<TopicStatus> {
        completed
            .iter()
            .enumerate()
            .map(|(i, &done)| {
                if done {
                    TopicStatus::Completed
                } else if i == 0 || completed[i - 1] {
                    TopicStatus::Available
                } else {
                    TopicStatus::Locked
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn progress_status_strings() {
        for status in [
            ProgressStatus::NotStarted,
            ProgressStatus::InProgress,
            ProgressStatus::Completed,
        ] {
            assert_eq!(ProgressStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(matches!(
            ProgressStatus::try_from("done"),
            Err(DatabaseError::InvalidStatus(_))
        ));
    }

    #[test]
    fn topic_statuses_are_linear() {
        use TopicStatus::*;
        assert!(TopicStatus::derive(&[]).is_empty());
        assert_eq!(TopicStatus::derive(&[false, false, false]), vec![Available, Locked, Locked]);
        assert_eq!(TopicStatus::derive(&[true, false, false]), vec![Completed, Available, Locked]);
        assert_eq!(TopicStatus::derive(&[true, true, true]), vec![Completed, Completed, Completed]);
    }
}
