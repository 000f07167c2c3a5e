use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// An election as served by the backend.
///
/// Snapshots are read-only: the client never mutates them locally, it
/// re-fetches after a successful write and re-derives whatever it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Administrative switch, independent of the time window. An election
    /// can be inside its window and still be disabled.
    pub is_active: bool,
    /// Insertion order is display order.
    pub candidates: Vec<Candidate>,
    /// Maintained by the backend; never computed here.
    #[serde(default)]
    pub total_votes: u64,
}

/// A candidate standing in an election. Owned by its election; never
/// exists independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub party: String,
}

/// Where an election sits in its lifecycle at a given instant.
///
/// Retirement is derived, not stored: there is no "ended" flag anywhere,
/// only a window and an admin switch to classify against the clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElectionStatus {
    /// The window has not opened yet.
    Upcoming,
    /// Inside the window and administratively enabled.
    Active,
    /// The window has passed, or the admin switch is off.
    Ended,
}

impl ElectionStatus {
    /// Votes are accepted only while the election is active.
    pub fn is_votable(self) -> bool {
        matches!(self, ElectionStatus::Active)
    }
}

impl std::fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ElectionStatus::Upcoming => "upcoming",
            ElectionStatus::Active => "active",
            ElectionStatus::Ended => "ended",
        })
    }
}

impl Election {
    /// Classify this election at `now`. First match wins; both window
    /// bounds are inclusive.
    ///
    /// Total and pure: a degenerate window (end before start) falls
    /// through to `Ended` once the start has passed, and is never votable.
    /// Callers must re-evaluate on every use rather than cache the result,
    /// since `now` advances.
    pub fn status_at(&self, now: DateTime<Utc>) -> ElectionStatus {
        if now < self.start_date {
            ElectionStatus::Upcoming
        } else if now <= self.end_date && self.is_active {
            ElectionStatus::Active
        } else {
            ElectionStatus::Ended
        }
    }

    pub fn is_votable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now).is_votable()
    }

    /// The results page shows an election once its window has passed or an
    /// admin has switched it off.
    pub fn is_completed_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now || !self.is_active
    }

    /// Look up one of this election's candidates.
    pub fn candidate(&self, id: &Id) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }
}

/// Headline counters for the voter dashboard.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VoterStats {
    /// Elections open for voting right now.
    pub available: usize,
    /// Enabled elections whose window has not opened yet.
    pub upcoming: usize,
    /// Votes this principal has cast, per their history.
    pub voted: usize,
}

impl VoterStats {
    pub fn derive(elections: &[Election], votes_cast: usize, now: DateTime<Utc>) -> Self {
        let available = elections
            .iter()
            .filter(|election| election.is_votable_at(now))
            .count();
        let upcoming = elections
            .iter()
            .filter(|election| {
                election.is_active && election.status_at(now) == ElectionStatus::Upcoming
            })
            .count();
        Self {
            available,
            upcoming,
            voted: votes_cast,
        }
    }
}

/// Headline counters for the admin dashboard.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AdminStats {
    /// Every election, whatever its state.
    pub total: usize,
    /// Elections with the admin switch on.
    pub active: usize,
    /// Ballots cast across all elections, per the backend's counters.
    pub total_votes: u64,
}

impl AdminStats {
    pub fn derive(elections: &[Election]) -> Self {
        Self {
            total: elections.len(),
            active: elections
                .iter()
                .filter(|election| election.is_active)
                .count(),
            total_votes: elections.iter().map(|election| election.total_votes).sum(),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Election {
        /// An enabled election running through the whole of 2024-01-01.
        pub fn example() -> Self {
            Self {
                id: Id::from("e1"),
                title: "Club Captain 2024".to_string(),
                description: "Annual captain election".to_string(),
                start_date: "2024-01-01T00:00:00Z".parse().unwrap(),
                end_date: "2024-01-02T00:00:00Z".parse().unwrap(),
                is_active: true,
                candidates: vec![
                    Candidate::example("c1", "Alice Aster"),
                    Candidate::example("c2", "Bob Birch"),
                    Candidate::example("c3", "Carol Cedar"),
                ],
                total_votes: 0,
            }
        }
    }

    impl Candidate {
        pub fn example(id: &str, name: &str) -> Self {
            Self {
                id: Id::from(id),
                name: name.to_string(),
                party: "Independent".to_string(),
            }
        }
    }
}
