use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// Result set for one election, as computed by the backend.
///
/// All counts and percentages are produced server-side; this type only
/// ranks and classifies what it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub total_votes: u64,
    pub candidates: Vec<CandidateResult>,
}

/// A candidate within a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub party: String,
    pub votes: u64,
    /// Vote share as served. Trusted for display, never used for ordering.
    pub percentage: f64,
}

/// Derived standing of the candidates in one election.
#[derive(Debug, PartialEq)]
pub struct Tally<'a> {
    /// Plurality winner: most votes, no majority threshold.
    pub winner: &'a CandidateResult,
    /// All candidates, most votes first. Ties keep their input order.
    pub ranking: Vec<&'a CandidateResult>,
}

impl ElectionResults {
    /// Rank the candidates and pick the winner. `None` only when the
    /// result set has no candidates at all.
    ///
    /// Ordering derives from the raw vote counts. The served percentages
    /// are rounded and could flip an order the counts don't support.
    pub fn tally(&self) -> Option<Tally<'_>> {
        let mut ranking: Vec<&CandidateResult> = self.candidates.iter().collect();
        // Stable sort: tied candidates keep their original order.
        ranking.sort_by(|a, b| b.votes.cmp(&a.votes));
        let winner = *ranking.first()?;
        Some(Tally { winner, ranking })
    }

    /// Nobody voted. The tally still names a nominal winner by tie-break;
    /// callers are expected to flag this case separately.
    pub fn is_zero_turnout(&self) -> bool {
        self.total_votes == 0
    }
}

/// One past vote of the current principal, from their voting history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(rename = "_id")]
    pub id: Id,
    pub election_id: Id,
    pub candidate_id: Id,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
