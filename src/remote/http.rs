//! Blocking HTTP client for the vault API

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::types::{
    ActivationRequest, ApiResponse, AuthToken, OtpChallenge, OtpResponse, OtpSendRequest,
    OtpStatusRequest, UploadRecord, UploadRequest,
};
use super::RemoteBackupClient;
use crate::config::settings::ApiSettings;
use crate::config::{GithubContext, OtpMethod};
use crate::error::{ShieldError, ShieldResult};
use crate::github::{repository_activation_details, ActionsApi};

const OTP_SOURCE: &str = "FileDownload";

/// Vault client backed by reqwest
pub struct HttpBackupClient<'a> {
    client: Client,
    base_url: String,
    /// Repository lookups for the activation request
    github: &'a dyn ActionsApi,
    context: &'a GithubContext,
    endpoint_type: String,
}

impl<'a> HttpBackupClient<'a> {
    pub fn new(
        settings: &ApiSettings,
        endpoint_type: &str,
        github: &'a dyn ActionsApi,
        context: &'a GithubContext,
    ) -> ShieldResult<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            github,
            context,
            endpoint_type: endpoint_type.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, turning transport errors and non-2xx statuses into
    /// `Remote` errors that carry the status and body
    fn send(&self, request: RequestBuilder, context: &str) -> ShieldResult<Response> {
        let response = request
            .send()
            .map_err(|e| ShieldError::remote(context, None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ShieldError::remote(context, Some(status.as_u16()), body));
        }
        Ok(response)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> ShieldResult<T> {
        let envelope: ApiResponse<T> = self
            .send(request, context)?
            .json()
            .map_err(|e| ShieldError::remote(context, None, format!("invalid response: {}", e)))?;
        envelope.into_data(context)
    }
}

impl RemoteBackupClient for HttpBackupClient<'_> {
    fn authenticate(&self, activation_code: &str) -> ShieldResult<AuthToken> {
        info!("Authenticating with the vault API");

        let details =
            repository_activation_details(self.github, self.context, &self.endpoint_type)?;
        let body = ActivationRequest {
            activation_code,
            details: &details,
        };

        let token: AuthToken = self.send_json(
            self.client.post(self.url("/endpoint/activation")).json(&body),
            "Authentication failed",
        )?;

        info!("Authentication successful");
        Ok(token)
    }

    fn upload_backup(&self, request: UploadRequest, token: &str) -> ShieldResult<UploadRecord> {
        info!("Uploading backup file: {}", request.file_name);

        let fields = request.form_fields();
        let file = Part::bytes(request.file)
            .file_name(request.file_name)
            .mime_str("application/octet-stream")?;

        let form = fields
            .into_iter()
            .fold(Form::new().part("file", file), |form, (name, value)| {
                form.text(name, value)
            });

        let record: UploadRecord = self.send_json(
            self.client
                .post(self.url("/backup/shield"))
                .bearer_auth(token)
                .multipart(form),
            "Failed to upload backup",
        )?;

        info!("Backup uploaded successfully");
        Ok(record)
    }

    fn request_otp(&self, method: OtpMethod, token: &str) -> ShieldResult<OtpChallenge> {
        info!("Requesting OTP via {}", method);

        let body = OtpSendRequest {
            method: method.as_str(),
            source: OTP_SOURCE,
            otp_generation_mode: "Number",
        };

        let response: OtpResponse = self.send_json(
            self.client
                .post(self.url("/OTP/Send"))
                .bearer_auth(token)
                .json(&body),
            "Failed to request OTP",
        )?;

        info!("OTP requested successfully");
        OtpChallenge::try_from(response)
    }

    fn verify_otp(&self, unique_key: &str, token: &str) -> ShieldResult<bool> {
        match self.otp_status(unique_key, token) {
            Ok(verified) => Ok(verified),
            Err(e) => {
                warn!("OTP status check failed, treating as not verified: {}", e);
                Ok(false)
            }
        }
    }

    fn download_backup(
        &self,
        file_version_id: &str,
        token: &str,
        unique_key: &str,
    ) -> ShieldResult<Vec<u8>> {
        info!("Downloading backup with version ID: {}", file_version_id);

        let response = self.send(
            self.client
                .get(self.url(&format!("/restore/{}", file_version_id)))
                .bearer_auth(token)
                .header("X-Unique-Key", unique_key)
                .header("X-Verification-Key", "1"),
            "Failed to download backup",
        )?;

        let bytes = response.bytes()?.to_vec();
        info!("Backup downloaded successfully. Size: {} bytes", bytes.len());
        Ok(bytes)
    }
}

impl HttpBackupClient<'_> {
    fn otp_status(&self, unique_key: &str, token: &str) -> ShieldResult<bool> {
        let response = self.send(
            self.client
                .post(self.url("/OTP/GetOTPStatus"))
                .bearer_auth(token)
                .json(&OtpStatusRequest { unique_key }),
            "Failed to check OTP status",
        )?;

        let envelope: ApiResponse<bool> = response.json().map_err(|e| {
            warn!("Unexpected OTP status response: {}", e);
            ShieldError::remote("Failed to check OTP status", None, e.to_string())
        })?;

        Ok(envelope.success && envelope.data == Some(true))
    }
}
