//! The gate a vote passes through, from opening an election to a
//! confirmed ballot.
//!
//! The flow owns its stage and refuses transitions that don't apply, so a
//! double-submit or a vote on a closed election can't be expressed. The
//! backend remains the sole authority on duplicates; the local check only
//! saves a doomed round trip.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::api::VotingBackend;
use crate::error::{Error, Result};
use crate::model::{Election, Id};

/// Where a voting attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteStage {
    /// Nothing opened yet.
    Idle,
    /// Asking the backend whether this principal already voted.
    Checking,
    /// Open for input, no candidate chosen.
    Ready,
    /// A candidate is chosen; choosing again replaces it.
    Selecting(Id),
    /// The ballot is in flight. No concurrent submission can start.
    Submitting(Id),
    /// The backend confirmed the ballot.
    Success,
    /// This principal had already voted here.
    AlreadyVoted,
}

impl VoteStage {
    /// Terminal stages accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VoteStage::Success | VoteStage::AlreadyVoted)
    }
}

/// A single voting attempt against one election.
pub struct VoteFlow<'a, B: VotingBackend> {
    backend: &'a B,
    election: &'a Election,
    stage: VoteStage,
}

impl<'a, B: VotingBackend> VoteFlow<'a, B> {
    pub fn new(backend: &'a B, election: &'a Election) -> Self {
        Self {
            backend,
            election,
            stage: VoteStage::Idle,
        }
    }

    pub fn stage(&self) -> &VoteStage {
        &self.stage
    }

    /// Open the election for voting.
    ///
    /// Runs the eligibility checks in order: the election must be open at
    /// `now`, and the principal must not have voted already. A failed
    /// status check drops back to idle with the error so the attempt can
    /// be retried.
    pub fn open(&mut self, now: DateTime<Utc>) -> Result<&VoteStage> {
        if self.stage != VoteStage::Idle {
            return Err(Error::Validation(
                "this election is already open".to_string(),
            ));
        }
        if !self.election.is_votable_at(now) {
            return Err(Error::Validation(
                "this election is not open for voting".to_string(),
            ));
        }
        self.stage = VoteStage::Checking;
        debug!("checking voting status for election {}", self.election.id);
        let has_voted = match self.backend.has_voted(&self.election.id) {
            Ok(has_voted) => has_voted,
            Err(err) => {
                self.stage = VoteStage::Idle;
                return Err(err);
            }
        };
        self.stage = if has_voted {
            VoteStage::AlreadyVoted
        } else {
            VoteStage::Ready
        };
        Ok(&self.stage)
    }

    /// Choose a candidate. Re-selecting replaces the previous choice.
    pub fn select(&mut self, candidate_id: Id) -> Result<()> {
        match self.stage {
            VoteStage::Ready | VoteStage::Selecting(_) => {}
            _ => {
                return Err(Error::Validation(
                    "this election is not open for input".to_string(),
                ))
            }
        }
        if self.election.candidate(&candidate_id).is_none() {
            return Err(Error::Validation(format!(
                "no candidate {candidate_id} in this election"
            )));
        }
        self.stage = VoteStage::Selecting(candidate_id);
        Ok(())
    }

    /// Submit the chosen ballot.
    ///
    /// With no candidate chosen this fails immediately, before any
    /// network traffic. A rejected or failed submission drops back to the
    /// same selection so the principal can retry or re-select.
    pub fn submit(&mut self) -> Result<&VoteStage> {
        let candidate_id = match &self.stage {
            VoteStage::Selecting(candidate_id) => candidate_id.clone(),
            VoteStage::Ready => {
                return Err(Error::Validation("please select a candidate".to_string()))
            }
            VoteStage::Submitting(_) => {
                return Err(Error::Validation(
                    "a submission is already in progress".to_string(),
                ))
            }
            _ => {
                return Err(Error::Validation(
                    "this election is not open for input".to_string(),
                ))
            }
        };
        self.stage = VoteStage::Submitting(candidate_id.clone());
        match self.backend.cast_vote(&self.election.id, &candidate_id) {
            Ok(()) => {
                info!(
                    "vote confirmed in election {} for candidate {}",
                    self.election.id, candidate_id
                );
                self.stage = VoteStage::Success;
                Ok(&self.stage)
            }
            Err(err) => {
                self.stage = VoteStage::Selecting(candidate_id);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Scripted backend that counts calls.
    struct FakeBackend {
        has_voted: bool,
        accept_vote: bool,
        checks: Cell<u32>,
        casts: Cell<u32>,
    }

    impl FakeBackend {
        fn fresh() -> Self {
            Self {
                has_voted: false,
                accept_vote: true,
                checks: Cell::new(0),
                casts: Cell::new(0),
            }
        }
    }

    impl VotingBackend for FakeBackend {
        fn has_voted(&self, _election_id: &Id) -> Result<bool> {
            self.checks.set(self.checks.get() + 1);
            Ok(self.has_voted)
        }

        fn cast_vote(&self, _election_id: &Id, _candidate_id: &Id) -> Result<()> {
            self.casts.set(self.casts.get() + 1);
            if self.accept_vote {
                Ok(())
            } else {
                Err(Error::Api {
                    status: 400,
                    message: "You have already voted in this election".to_string(),
                })
            }
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-01-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn happy_path_reaches_success() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        assert_eq!(flow.open(now()).unwrap(), &VoteStage::Ready);
        flow.select(Id::from("c2")).unwrap();
        assert_eq!(flow.submit().unwrap(), &VoteStage::Success);
        assert!(flow.stage().is_terminal());
        assert_eq!(backend.checks.get(), 1);
        assert_eq!(backend.casts.get(), 1);
    }

    #[test]
    fn prior_vote_short_circuits_to_already_voted() {
        let mut backend = FakeBackend::fresh();
        backend.has_voted = true;
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        assert_eq!(flow.open(now()).unwrap(), &VoteStage::AlreadyVoted);
        assert!(flow.stage().is_terminal());
        assert!(flow.select(Id::from("c1")).is_err());
        assert!(flow.submit().is_err());
        assert_eq!(backend.casts.get(), 0);
    }

    #[test]
    fn closed_election_never_opens() {
        let backend = FakeBackend::fresh();
        let mut election = Election::example();
        election.is_active = false;
        let mut flow = VoteFlow::new(&backend, &election);

        let err = flow.open(now()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.stage(), &VoteStage::Idle);
        // The eligibility check failed locally; nothing hit the backend.
        assert_eq!(backend.checks.get(), 0);
    }

    #[test]
    fn submit_without_selection_makes_no_request() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        let err = flow.submit().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.stage(), &VoteStage::Ready);
        assert_eq!(backend.casts.get(), 0);
    }

    #[test]
    fn reselecting_replaces_the_choice() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        flow.select(Id::from("c1")).unwrap();
        flow.select(Id::from("c3")).unwrap();
        assert_eq!(flow.stage(), &VoteStage::Selecting(Id::from("c3")));
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        let err = flow.select(Id::from("intruder")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.stage(), &VoteStage::Ready);
    }

    #[test]
    fn rejected_submission_recovers_to_the_same_selection() {
        let mut backend = FakeBackend::fresh();
        backend.accept_vote = false;
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        flow.select(Id::from("c2")).unwrap();
        let err = flow.submit().unwrap_err();
        assert_eq!(err.to_string(), "You have already voted in this election");
        // Recoverable: still selecting the same candidate, free to retry.
        assert_eq!(flow.stage(), &VoteStage::Selecting(Id::from("c2")));
        assert_eq!(backend.casts.get(), 1);
    }

    #[test]
    fn double_open_is_rejected() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        assert!(flow.open(now()).is_err());
        assert_eq!(backend.checks.get(), 1);
    }

    #[test]
    fn success_is_terminal() {
        let backend = FakeBackend::fresh();
        let election = Election::example();
        let mut flow = VoteFlow::new(&backend, &election);

        flow.open(now()).unwrap();
        flow.select(Id::from("c1")).unwrap();
        flow.submit().unwrap();
        assert!(flow.select(Id::from("c2")).is_err());
        assert!(flow.submit().is_err());
        assert_eq!(backend.casts.get(), 1);
    }
}
