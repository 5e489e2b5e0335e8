//! OTP verification gate for restores
//!
//! A restore may only download a backup after the operator verifies a
//! one-time passcode out of band. The flow requests the OTP, points the
//! operator at the verification page, then polls until the challenge is
//! verified or expires.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use crate::config::OtpMethod;
use crate::error::{ShieldError, ShieldResult};
use crate::logging::NOTICE_TARGET;
use crate::remote::{OtpChallenge, RemoteBackupClient};

/// Where the flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpState {
    Idle,
    Requested,
    Verified,
    Expired,
}

/// Requests an OTP and waits for the operator to verify it
pub struct OtpVerificationFlow<'a> {
    client: &'a dyn RemoteBackupClient,
    management_base_url: String,
    poll_interval: Duration,
    token: Option<String>,
    state: OtpState,
}

impl<'a> OtpVerificationFlow<'a> {
    pub fn new(client: &'a dyn RemoteBackupClient, management_base_url: &str) -> Self {
        Self {
            client,
            management_base_url: management_base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(5),
            token: None,
            state: OtpState::Idle,
        }
    }

    /// Override the pause between status checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> OtpState {
        self.state
    }

    /// Use this session token for every vault call
    pub fn set_auth_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn token(&self) -> ShieldResult<&str> {
        self.token.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
            ShieldError::Validation(
                "Authentication token not set. Call set_auth_token first.".to_string(),
            )
        })
    }

    /// Send an OTP and tell the operator where to verify it
    pub fn request_otp(&mut self, method: OtpMethod) -> ShieldResult<OtpChallenge> {
        let token = self.token()?;

        let challenge = self
            .client
            .request_otp(method, token)
            .map_err(|e| ShieldError::Otp(format!("Failed to request OTP: {}", e)))?;

        info!(target: NOTICE_TARGET, "OTP sent via {}.", method);
        info!(
            target: NOTICE_TARGET,
            "Please verify your OTP at: {}",
            self.verification_url(&challenge)
        );

        self.state = OtpState::Requested;
        Ok(challenge)
    }

    /// Management console page where the operator enters the OTP
    pub fn verification_url(&self, challenge: &OtpChallenge) -> String {
        format!(
            "{}/git-security/?createdAt={}&expiresAt={}&uniqueKey={}&source=FileDownload",
            self.management_base_url,
            encode_query(&format_timestamp(&challenge.created_at)),
            encode_query(&format_timestamp(&challenge.expires_at)),
            encode_query(&challenge.unique_key),
        )
    }

    /// Poll until the challenge is verified (`true`) or expires (`false`)
    ///
    /// A failed status check counts as "not verified yet".
    pub fn wait_for_otp_verification(
        &mut self,
        unique_key: &str,
        expires_at: DateTime<Utc>,
    ) -> ShieldResult<bool> {
        self.token()?;

        info!("Waiting for OTP verification...");
        info!("Verification will time out at: {}", format_timestamp(&expires_at));

        while Utc::now() < expires_at {
            if self.check_otp_status(unique_key)? {
                info!("OTP verified successfully");
                self.state = OtpState::Verified;
                return Ok(true);
            }

            debug!(
                "OTP not yet verified, {} remaining",
                format_remaining_time(expires_at)
            );
            thread::sleep(self.poll_interval);
        }

        error!("OTP verification timed out");
        self.state = OtpState::Expired;
        Ok(false)
    }

    /// Check the challenge once, without polling
    pub fn check_otp_status(&self, unique_key: &str) -> ShieldResult<bool> {
        let token = self.token()?;

        match self.client.verify_otp(unique_key, token) {
            Ok(verified) => Ok(verified),
            Err(e) => {
                warn!("OTP verification check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Whole seconds until `expires_at`, rounded up; zero once expired
pub fn remaining_seconds(expires_at: DateTime<Utc>) -> u64 {
    remaining_seconds_at(expires_at, Utc::now())
}

fn remaining_seconds_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}

/// Remaining time as `"{m}m {s}s"`, `"{s}s"` or `"Expired"`
pub fn format_remaining_time(expires_at: DateTime<Utc>) -> String {
    format_seconds(remaining_seconds(expires_at))
}

fn format_seconds(seconds: u64) -> String {
    match (seconds / 60, seconds % 60) {
        (0, 0) => "Expired".to_string(),
        (0, secs) => format!("{}s", secs),
        (mins, secs) => format!("{}m {}s", mins, secs),
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Percent-encode a query parameter value (`application/x-www-form-urlencoded`)
fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
