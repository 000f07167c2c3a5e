//! The authenticated session and role-based routing.
//!
//! A session is plain data: who is signed in and the bearer token the
//! backend issued. Flows take it by reference and never mutate it; signing
//! in or out replaces the whole value. The session can be persisted to a
//! JSON file so separate invocations share one sign-in.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Id;

/// What a signed-in principal is allowed to see.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Voter,
}

impl Role {
    /// Where this role lands immediately after signing in.
    pub fn landing(self) -> Route {
        match self {
            Role::Admin => Route::AdminDashboard,
            Role::Voter => Route::VoterDashboard,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Voter => "voter",
        })
    }
}

/// The signed-in principal as returned by OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// An authenticated session: the user plus their bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn login(user: User, token: String) -> Self {
        Self { user, token }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Persist to `path`, replacing any previous session wholesale.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved session. A missing file is simply "not
    /// signed in"; a corrupt file is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let session = serde_json::from_str(&json)?;
        Ok(Some(session))
    }

    /// Sign out: drop the persisted session. Already being signed out is
    /// not an error.
    pub fn logout(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// The navigable surfaces of the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    AdminDashboard,
    VoterDashboard,
}

/// Decide where a navigation attempt actually goes.
///
/// Unauthenticated requests for a dashboard bounce to sign-in; requests
/// for the wrong dashboard bounce to the principal's own; a signed-in
/// principal asking for the sign-in page lands on their dashboard instead.
pub fn resolve(session: Option<&Session>, requested: Route) -> Route {
    match session {
        None => Route::Login,
        Some(session) => match requested {
            Route::Login => session.role().landing(),
            Route::AdminDashboard | Route::VoterDashboard => {
                if requested == session.role().landing() {
                    requested
                } else {
                    session.role().landing()
                }
            }
        },
    }
}
