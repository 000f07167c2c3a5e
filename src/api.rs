//! Blocking HTTP client for the election backend.
//!
//! Every operation is a plain method call that suspends the caller until
//! the backend answers. Failed requests surface as [`Error::Api`] carrying
//! the backend's own message where it sent one, or a per-operation
//! fallback where it didn't.

use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::otp::Code;
use crate::model::{Election, ElectionResults, ElectionSpec, Id, VoteRecord};
use crate::session::User;

/// Backend operations the voting flow depends on. Split out so the flow
/// can be driven against a scripted backend in tests.
pub trait VotingBackend {
    /// Has the current principal already voted in this election?
    fn has_voted(&self, election_id: &Id) -> Result<bool>;

    /// Cast a vote. The backend is the sole authority on duplicates and
    /// rejects a second vote regardless of what the client believes.
    fn cast_vote(&self, election_id: &Id, candidate_id: &Id) -> Result<()>;
}

/// A signed-in (or anonymous) connection to the backend.
pub struct Client {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every subsequent request.
    pub fn authenticate(&mut self, token: String) {
        self.token = Some(token);
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}/{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send, check the status, decode the body.
    fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder, fallback: &str) -> Result<T> {
        let response = checked(builder.send()?, fallback)?;
        Ok(response.json()?)
    }

    /// Send and check the status, discarding any body.
    fn execute_unit(&self, builder: RequestBuilder, fallback: &str) -> Result<()> {
        checked(builder.send()?, fallback)?;
        Ok(())
    }

    /// All elections, newest first as served.
    pub fn elections(&self) -> Result<Vec<Election>> {
        self.execute(
            self.request(Method::GET, "elections"),
            "Failed to load elections",
        )
    }

    /// Server-computed results for one election.
    pub fn results(&self, election_id: &Id) -> Result<ElectionResults> {
        self.execute(
            self.request(Method::GET, &format!("elections/{election_id}/results")),
            "Failed to load results",
        )
    }

    /// Create an election. The payload is validated locally first; nothing
    /// goes on the wire if the spec is malformed.
    pub fn create_election(&self, spec: ElectionSpec) -> Result<Election> {
        let spec = spec.validated()?;
        self.execute(
            self.request(Method::POST, "elections").json(&spec),
            "Failed to create election",
        )
    }

    pub fn delete_election(&self, election_id: &Id) -> Result<()> {
        self.execute_unit(
            self.request(Method::DELETE, &format!("elections/{election_id}")),
            "Failed to delete election",
        )
    }

    /// The current principal's past votes.
    pub fn vote_history(&self) -> Result<Vec<VoteRecord>> {
        self.execute(
            self.request(Method::GET, "votes/history"),
            "Failed to load voting history",
        )
    }

    /// Start signing in. The backend responds by emailing a code; the
    /// returned handle carries what verification needs.
    pub fn login(&self, email: &str, password: &str) -> Result<PendingOtp> {
        self.execute(
            self.request(Method::POST, "auth/login").json(&LoginBody { email, password }),
            "Login failed",
        )
    }

    /// Create an account. Like login, this triggers an emailed code and
    /// hands back what verification needs.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<PendingOtp> {
        self.execute(
            self.request(Method::POST, "auth/register").json(&RegisterBody {
                name,
                email,
                password,
            }),
            "Registration failed",
        )
    }

    /// Request a fresh code for a pending sign-in. This rides the login
    /// endpoint; the backend keys resends on the email alone, so the
    /// password field is a placeholder.
    pub fn resend_otp(&self, email: &str) -> Result<PendingOtp> {
        self.login(email, "dummy")
    }

    /// Exchange a code for a session.
    pub fn verify_otp(&self, user_id: &Id, code: Code) -> Result<AuthResponse> {
        self.execute(
            self.request(Method::POST, "auth/verify-otp").json(&VerifyBody {
                user_id,
                otp: code,
            }),
            "Verification failed",
        )
    }
}

impl VotingBackend for Client {
    fn has_voted(&self, election_id: &Id) -> Result<bool> {
        let body: HasVotedBody = self.execute(
            self.request(Method::GET, &format!("votes/check/{election_id}")),
            "Failed to check voting status",
        )?;
        Ok(body.has_voted)
    }

    fn cast_vote(&self, election_id: &Id, candidate_id: &Id) -> Result<()> {
        self.execute_unit(
            self.request(Method::POST, "votes").json(&CastVoteBody {
                election_id,
                candidate_id,
            }),
            "Failed to cast vote",
        )
    }
}

/// Turn a non-2xx response into [`Error::Api`], preferring the backend's
/// own `message` over the fallback.
fn checked(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| fallback.to_string());
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody<'a> {
    user_id: &'a Id,
    otp: Code,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteBody<'a> {
    election_id: &'a Id,
    candidate_id: &'a Id,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HasVotedBody {
    has_voted: bool,
}

/// Sign-in acknowledged; a code is on its way to `email`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOtp {
    pub user_id: Id,
    pub email: String,
}

/// Successful verification: the principal and their bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}
