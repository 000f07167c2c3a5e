use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// Seconds a freshly issued code remains valid.
pub const OTP_TTL_SECONDS: u32 = 600;

/// A one-time passcode as entered by the user.
///
/// Codes are generated and checked server-side; the client only validates
/// the shape before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code([u8; CODE_LENGTH]);

impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut digits = [0u8; CODE_LENGTH];
        let mut count = 0;
        for c in raw.chars() {
            if count == CODE_LENGTH {
                return Err(ParseCodeError::Length(raw.chars().count()));
            }
            digits[count] = c.to_digit(10).ok_or(ParseCodeError::NotADigit(c))? as u8;
            count += 1;
        }
        if count != CODE_LENGTH {
            return Err(ParseCodeError::Length(count));
        }
        Ok(Self(digits))
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for digit in self.0 {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCodeError {
    #[error("the code must contain exactly {CODE_LENGTH} digits, found {0}")]
    Length(usize),
    #[error("the code must contain only digits, found '{0}'")]
    NotADigit(char),
}

/// What a tick of the countdown produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; seconds left.
    Running(u32),
    /// Just reached zero. Reported exactly once per attempt.
    Expired,
    /// Already expired or cancelled; nothing happened.
    Stopped,
}

/// Countdown for a single OTP attempt.
///
/// One logical tick per second, driven by whatever scheduler the caller
/// has. The remaining time never increases within an attempt; reaching
/// zero invalidates the attempt. Ownership guarantees a single live
/// countdown per attempt: restarting replaces the state in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    stopped: bool,
}

impl Countdown {
    /// Start a fresh countdown at the full TTL.
    pub fn start() -> Self {
        Self {
            remaining: OTP_TTL_SECONDS,
            stopped: false,
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    /// The countdown ran out (as opposed to being cancelled).
    pub fn is_expired(&self) -> bool {
        self.stopped && self.remaining == 0
    }

    /// One second elapses. Expiry is reported exactly once; every tick
    /// after that (or after cancellation) is a no-op.
    pub fn tick(&mut self) -> Tick {
        if self.stopped {
            return Tick::Stopped;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.stopped = true;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// Apply `seconds` ticks in one go, for callers that sync against the
    /// wall clock instead of scheduling per-second callbacks.
    pub fn advance(&mut self, seconds: u64) -> Tick {
        if seconds == 0 {
            return if self.stopped {
                Tick::Stopped
            } else {
                Tick::Running(self.remaining)
            };
        }
        let mut last = Tick::Stopped;
        for _ in 0..seconds {
            match self.tick() {
                Tick::Expired => return Tick::Expired,
                Tick::Stopped => break,
                running => last = running,
            }
        }
        last
    }

    /// Stop cleanly: no further ticks, no expiry emission. Used when the
    /// attempt is abandoned (verified, navigated away, torn down).
    pub fn cancel(&mut self) {
        self.stopped = true;
    }

    /// Resend: cancel the running countdown, then start over at the full
    /// TTL. There is never a second concurrent countdown.
    pub fn restart(&mut self) {
        self.cancel();
        *self = Countdown::start();
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format_seconds(self.remaining))
    }
}

/// Render seconds as `M:SS`: minutes un-padded, seconds zero-padded.
pub fn format_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_parses_six_digits() {
        let code: Code = "042137".parse().unwrap();
        assert_eq!(code.to_string(), "042137");
    }

    #[test]
    fn code_rejects_wrong_length() {
        assert_eq!("12345".parse::<Code>(), Err(ParseCodeError::Length(5)));
        assert_eq!("1234567".parse::<Code>(), Err(ParseCodeError::Length(7)));
        assert_eq!("".parse::<Code>(), Err(ParseCodeError::Length(0)));
    }

    #[test]
    fn code_rejects_non_digits() {
        assert_eq!("12a456".parse::<Code>(), Err(ParseCodeError::NotADigit('a')));
        // Non-ASCII digits don't count.
        assert_eq!("12٦456".parse::<Code>(), Err(ParseCodeError::NotADigit('٦')));
    }

    #[test]
    fn code_serializes_as_string() {
        let code: Code = "123456".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"123456\"");
        let back: Code = serde_json::from_str("\"123456\"").unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn full_countdown_expires_exactly_once() {
        let mut countdown = Countdown::start();
        let mut expirations = 0;
        for _ in 0..OTP_TTL_SECONDS {
            if countdown.tick() == Tick::Expired {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert!(countdown.is_expired());
        // Further ticks are inert.
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.tick(), Tick::Stopped);
    }

    #[test]
    fn formatting_is_minutes_and_padded_seconds() {
        assert_eq!(format_seconds(600), "10:00");
        assert_eq!(format_seconds(65), "1:05");
        assert_eq!(format_seconds(5), "0:05");
        assert_eq!(Countdown::start().to_string(), "10:00");
    }

    #[test]
    fn cancel_stops_ticking_without_expiry() {
        let mut countdown = Countdown::start();
        countdown.tick();
        countdown.cancel();
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert!(!countdown.is_expired());
    }

    #[test]
    fn restart_resets_to_full_ttl() {
        let mut countdown = Countdown::start();
        for _ in 0..100 {
            countdown.tick();
        }
        countdown.restart();
        assert_eq!(countdown.remaining_seconds(), OTP_TTL_SECONDS);
        assert_eq!(countdown.tick(), Tick::Running(OTP_TTL_SECONDS - 1));
    }

    #[test]
    fn restart_after_expiry_allows_one_more_expiry() {
        // One logical attempt chain: at most one live countdown, each full
        // run emitting its single expiry.
        let mut countdown = Countdown::start();
        assert_eq!(countdown.advance(u64::from(OTP_TTL_SECONDS)), Tick::Expired);
        countdown.restart();
        assert!(!countdown.is_expired());
        assert_eq!(countdown.advance(u64::from(OTP_TTL_SECONDS)), Tick::Expired);
        assert_eq!(countdown.advance(50), Tick::Stopped);
    }

    #[test]
    fn advance_syncs_in_bulk() {
        let mut countdown = Countdown::start();
        assert_eq!(countdown.advance(0), Tick::Running(600));
        assert_eq!(countdown.advance(535), Tick::Running(65));
        assert_eq!(countdown.to_string(), "1:05");
        assert_eq!(countdown.advance(64), Tick::Running(1));
        assert_eq!(countdown.advance(10), Tick::Expired);
        assert_eq!(countdown.advance(10), Tick::Stopped);
    }
}
