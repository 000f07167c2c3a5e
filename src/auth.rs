//! The OTP sign-in flow: a pending challenge plus its countdown.
//!
//! Credentials are only ever the first step; a sign-in completes when the
//! emailed code is verified before the countdown runs out.

use log::info;

use crate::api::{Client, PendingOtp};
use crate::error::{Error, Result};
use crate::model::otp::{Code, Countdown, Tick};
use crate::session::Session;

/// A sign-in waiting on its emailed code.
pub struct OtpFlow {
    pending: PendingOtp,
    countdown: Countdown,
}

impl OtpFlow {
    /// Submit credentials and start the verification window.
    pub fn begin(api: &Client, email: &str, password: &str) -> Result<Self> {
        let pending = api.login(email, password)?;
        info!("verification code sent to {}", pending.email);
        Ok(Self {
            pending,
            countdown: Countdown::start(),
        })
    }

    /// Create an account and start the verification window. Registration
    /// sends a code just like login does; the flow is identical from here.
    pub fn begin_registration(
        api: &Client,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let pending = api.register(name, email, password)?;
        info!("verification code sent to {}", pending.email);
        Ok(Self {
            pending,
            countdown: Countdown::start(),
        })
    }

    /// The address the code was sent to.
    pub fn email(&self) -> &str {
        &self.pending.email
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Sync the countdown against elapsed wall time.
    pub fn advance(&mut self, seconds: u64) -> Tick {
        self.countdown.advance(seconds)
    }

    /// Verify the entered code and produce a session.
    ///
    /// Expired and malformed codes are rejected locally without touching
    /// the network. On success the countdown is cancelled; it has served
    /// its purpose. A wrong code is recoverable: the flow stays pending
    /// and the caller may try again within the window.
    pub fn verify(&mut self, api: &Client, raw_code: &str) -> Result<Session> {
        if self.countdown.is_expired() {
            return Err(Error::Validation(
                "the code has expired, request a new one".to_string(),
            ));
        }
        let code: Code = raw_code
            .trim()
            .parse()
            .map_err(|err| Error::Validation(format!("{err}")))?;
        let auth = api.verify_otp(&self.pending.user_id, code)?;
        self.countdown.cancel();
        info!("signed in as {} ({})", auth.user.email, auth.user.role);
        Ok(Session::login(auth.user, auth.token))
    }

    /// Request a fresh code for the same email. The old code is dead
    /// either way; the countdown restarts at the full window.
    pub fn resend(&mut self, api: &Client) -> Result<()> {
        self.pending = api.resend_otp(&self.pending.email)?;
        self.countdown.restart();
        info!("verification code resent to {}", self.pending.email);
        Ok(())
    }
}
