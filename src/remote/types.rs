//! Vault API data types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, GithubContext};
use crate::error::{ShieldError, ShieldResult};
use crate::git::CommitInfo;
use crate::github::ActivationDetails;

/// Response envelope every vault endpoint uses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Payload of a successful response
    pub fn into_data(self, context: &str) -> ShieldResult<T> {
        if !self.success {
            let detail = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request was not successful".to_string());
            return Err(ShieldError::remote(context, None, detail));
        }

        self.data
            .ok_or_else(|| ShieldError::remote(context, None, "response had no data"))
    }
}

/// Body of `POST /endpoint/activation`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest<'a> {
    pub activation_code: &'a str,
    #[serde(flatten)]
    pub details: &'a ActivationDetails,
}

/// Session issued by a successful activation
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    #[serde(default)]
    pub endpoint_id: u64,
    #[serde(default)]
    pub endpoint_code: String,
    #[serde(default)]
    pub endpoint_name: String,
    #[serde(default)]
    pub user_id: u64,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"[REDACTED]")
            .field("endpoint_id", &self.endpoint_id)
            .field("endpoint_code", &self.endpoint_code)
            .field("endpoint_name", &self.endpoint_name)
            .finish()
    }
}

/// Identifiers of an uploaded backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub record_id: String,
    pub directory_record_id: String,
    pub file_record_id: String,
}

/// A time-boxed OTP ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub unique_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// OTP challenge as it comes over the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    pub unique_key: String,
    pub created_at: String,
    pub expires_at: String,
}

impl TryFrom<OtpResponse> for OtpChallenge {
    type Error = ShieldError;

    fn try_from(response: OtpResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&response.created_at)?,
            expires_at: parse_timestamp(&response.expires_at)?,
            unique_key: response.unique_key,
        })
    }
}

/// Parse an API timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(value: &str) -> ShieldResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ShieldError::Otp(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Body of `POST /OTP/Send`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OtpSendRequest<'a> {
    #[serde(rename = "Type")]
    pub method: &'a str,
    pub source: &'a str,
    pub otp_generation_mode: &'a str,
}

/// Body of `POST /OTP/GetOTPStatus`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpStatusRequest<'a> {
    pub unique_key: &'a str,
}

/// Run and commit details attached to an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupMetadata {
    pub event: String,
    pub git_ref: String,
    pub actor: String,
    pub owner: String,
    pub owner_type: String,
    pub commit: CommitInfo,
    /// Reported committer; the author stands in for it
    pub committer: String,
}

impl BackupMetadata {
    pub fn new(context: &GithubContext, commit: CommitInfo) -> Self {
        Self {
            event: context.event_name.clone(),
            git_ref: context.git_ref.clone(),
            actor: context.actor.clone(),
            owner: context.owner.clone(),
            owner_type: context.owner_type.clone(),
            committer: commit.author.clone(),
            commit,
        }
    }
}

/// Everything `POST /backup/shield` needs
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: Vec<u8>,
    pub file_name: String,
    /// Size of the uncompressed tar archive
    pub size: u64,
    /// Size of the encrypted envelope
    pub compressed_file_size: u64,
    pub attributes: u32,
    pub full_path: String,
    pub compression_engine: String,
    pub compression_level: String,
    pub encryption_type: String,
    pub revision_type: u32,
    pub metadata: BackupMetadata,
}

impl UploadRequest {
    /// Assemble an upload from the envelope and the run configuration
    pub fn new(
        file: Vec<u8>,
        file_name: String,
        original_size: u64,
        commit: CommitInfo,
        config: &AppConfig,
    ) -> Self {
        let upload = &config.settings.upload;
        let context = &config.context;

        Self {
            compressed_file_size: file.len() as u64,
            file,
            full_path: format!("/{}/{}/{}", context.owner, context.repo, file_name),
            file_name,
            size: original_size,
            attributes: upload.attributes,
            compression_engine: upload.compression_engine.clone(),
            compression_level: upload.compression_level.clone(),
            encryption_type: upload.encryption_type.clone(),
            revision_type: upload.revision_type,
            metadata: BackupMetadata::new(context, commit),
        }
    }

    /// Multipart text fields, in the order the vault documents them
    ///
    /// Commit fields are omitted for repositories without commits.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let meta = &self.metadata;
        let mut fields = vec![
            ("Size", self.size.to_string()),
            ("CompressedFileSize", self.compressed_file_size.to_string()),
            ("Attributes", self.attributes.to_string()),
            ("FileName", self.file_name.clone()),
            ("CompressionEngine", self.compression_engine.clone()),
            ("CompressionLevel", self.compression_level.clone()),
            ("FullPath", self.full_path.clone()),
            ("EncryptionType", self.encryption_type.clone()),
            ("RevisionType", self.revision_type.to_string()),
            ("MetaData[Event]", meta.event.clone()),
            ("MetaData[Ref]", meta.git_ref.clone()),
            ("MetaData[Actor]", meta.actor.clone()),
            ("MetaData[Owner]", meta.owner.clone()),
            ("MetaData[OwnerType]", meta.owner_type.clone()),
        ];

        if !meta.commit.is_empty() {
            fields.extend([
                ("MetaData[Commit]", meta.commit.hash.clone()),
                ("MetaData[CommitShort]", meta.commit.short_hash.clone()),
                ("MetaData[Author]", meta.commit.author.clone()),
                ("MetaData[Date]", meta.commit.date.clone()),
                ("MetaData[Committer]", meta.committer.clone()),
                ("MetaData[Message]", meta.commit.message.clone()),
            ]);
        }

        fields
    }
}
