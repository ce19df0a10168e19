//! One-time numeric codes.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

/// Number of digits in a code.
pub const OTP_LENGTH: usize = 6;

/// Longest accepted code lifetime (one day).
pub const MAX_OTP_LIFETIME_MINUTES: u64 = 24 * 60;

/// Random numeric code of [`OTP_LENGTH`] digits. Leading zeros are kept.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Moment a code issued now stops being valid.
pub fn otp_expiration(minutes: u64) -> Result<DateTime<Utc>, OtpError> {
    if minutes > MAX_OTP_LIFETIME_MINUTES {
        return Err(OtpError::Lifetime(minutes));
    }

    Duration::try_minutes(minutes as i64)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or(OtpError::Lifetime(minutes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("Invalid Otp.")]
    Invalid,

    #[error("Otp is expired.")]
    Expired,

    #[error("Otp lifetime of {0} minutes is out of range")]
    Lifetime(u64),
}

/// An issued code and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    /// Issue a fresh code valid for `minutes`.
    pub fn issue(minutes: u64) -> Result<Self, OtpError> {
        Ok(Self {
            code: generate_otp(),
            expires_at: otp_expiration(minutes)?,
        })
    }

    /// Check a submitted code at time `now`. Expiry is checked first.
    pub fn check(&self, candidate: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        if now > self.expires_at {
            return Err(OtpError::Expired);
        }
        if candidate != self.code {
            return Err(OtpError::Invalid);
        }
        Ok(())
    }
}
