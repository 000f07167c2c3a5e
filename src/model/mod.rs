//! Domain types shared between the API client and the flows built on it.

mod election;
mod id;
pub mod otp;
mod results;
mod spec;

pub use election::{AdminStats, Candidate, Election, ElectionStatus, VoterStats};
pub use id::Id;
pub use results::{CandidateResult, ElectionResults, Tally, VoteRecord};
pub use spec::{CandidateSpec, ElectionSpec};
