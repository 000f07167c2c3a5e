use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Payload for creating a new election.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub candidates: Vec<CandidateSpec>,
}

/// A candidate row in an election spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
}

impl CandidateSpec {
    /// A row counts only if both fields are non-blank.
    fn is_filled(&self) -> bool {
        !self.name.trim().is_empty() && !self.party.trim().is_empty()
    }
}

impl ElectionSpec {
    /// Check the spec locally and strip blank candidate rows.
    ///
    /// Failures here never reach the network; the backend revalidates on
    /// its side regardless.
    pub fn validated(mut self) -> Result<Self> {
        if self.start_date >= self.end_date {
            return Err(Error::Validation(
                "end date must be after start date".to_string(),
            ));
        }
        self.candidates.retain(CandidateSpec::is_filled);
        if self.candidates.len() < 2 {
            return Err(Error::Validation(
                "at least 2 candidates with names and parties are required".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionSpec {
        pub fn example() -> Self {
            Self {
                title: "Treasurer 2024".to_string(),
                description: "Yearly treasurer election".to_string(),
                start_date: "2024-03-01T00:00:00Z".parse().unwrap(),
                end_date: "2024-03-08T00:00:00Z".parse().unwrap(),
                candidates: vec![
                    CandidateSpec {
                        name: "Dana Dew".to_string(),
                        party: "Reform".to_string(),
                    },
                    CandidateSpec {
                        name: "Evan Elm".to_string(),
                        party: "Unity".to_string(),
                    },
                ],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_spec_passes_unchanged() {
        let spec = ElectionSpec::example().validated().unwrap();
        assert_eq!(spec.candidates.len(), 2);
    }

    #[test]
    fn end_must_be_after_start() {
        let mut spec = ElectionSpec::example();
        spec.end_date = spec.start_date;
        let err = spec.validated().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn blank_candidate_rows_are_stripped() {
        let mut spec = ElectionSpec::example();
        spec.candidates.push(CandidateSpec {
            name: "   ".to_string(),
            party: "Ghost".to_string(),
        });
        spec.candidates.push(CandidateSpec {
            name: "No Party".to_string(),
            party: "".to_string(),
        });
        let spec = spec.validated().unwrap();
        assert_eq!(spec.candidates.len(), 2);
    }

    #[test]
    fn fewer_than_two_filled_candidates_is_rejected() {
        let mut spec = ElectionSpec::example();
        spec.candidates[1].party = " ".to_string();
        let err = spec.validated().unwrap_err();
        assert!(err.is_validation());
    }
}
