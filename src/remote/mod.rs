//! Remote vault access
//!
//! Workflows talk to the vault through [`RemoteBackupClient`]; the HTTP
//! implementation lives in [`http`].

pub mod http;
pub mod types;

use crate::config::OtpMethod;
use crate::error::ShieldResult;

pub use http::HttpBackupClient;
pub use types::{
    ApiResponse, AuthToken, BackupMetadata, OtpChallenge, UploadRecord, UploadRequest,
};

/// Operations the vault offers
pub trait RemoteBackupClient {
    /// Exchange an activation code for a session token
    fn authenticate(&self, activation_code: &str) -> ShieldResult<AuthToken>;

    /// Upload an encrypted backup
    fn upload_backup(&self, request: UploadRequest, token: &str) -> ShieldResult<UploadRecord>;

    /// Ask the vault to send an OTP to the operator
    fn request_otp(&self, method: OtpMethod, token: &str) -> ShieldResult<OtpChallenge>;

    /// Whether the operator has verified the OTP yet
    ///
    /// Transport and parse failures count as "not yet".
    fn verify_otp(&self, unique_key: &str, token: &str) -> ShieldResult<bool>;

    /// Download an encrypted backup; requires a verified OTP
    fn download_backup(
        &self,
        file_version_id: &str,
        token: &str,
        unique_key: &str,
    ) -> ShieldResult<Vec<u8>>;
}
