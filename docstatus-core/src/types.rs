//! Wire and domain types for the verification service.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The tri-state trust signal shown to the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, uniffi::Enum,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DocStatus {
    /// The document is genuine.
    Valid,
    /// The document is genuine but needs attention (e.g. expires soon).
    Warning,
    /// The document is unknown, revoked, expired, or could not be checked.
    Invalid,
}

/// Status codes the server classifies documents with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum ServerStatus {
    Green,
    Yellow,
    Red,
}

impl DocStatus {
    /// Maps a server status code, case-insensitively. Anything unrecognised
    /// is treated as [`DocStatus::Invalid`] so there is always a verdict.
    #[must_use]
    pub fn from_server_status(status: &str) -> Self {
        match ServerStatus::from_str(status) {
            Ok(ServerStatus::Green) => Self::Valid,
            Ok(ServerStatus::Yellow) => Self::Warning,
            Ok(ServerStatus::Red) => Self::Invalid,
            Err(_) => {
                log::warn!("unrecognised server status {status:?}, treating as invalid");
                Self::Invalid
            }
        }
    }
}

/// Response of the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct LoginResponse {
    /// Bearer token to present on protected endpoints.
    pub access_token: String,
    /// Token type, normally `bearer`.
    pub token_type: String,
}

/// Body of a verify call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct VerificationRequest<'a> {
    pub qr_code_data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<&'a str>,
}

/// Response of the verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct VerificationResponse {
    /// Server status code: `green`, `yellow` or `red`.
    pub status: String,
    /// Human readable explanation of the verdict.
    pub message: String,
    /// Document type, when the document is known.
    #[serde(default)]
    pub doc_type: Option<String>,
    /// Document owner, when the document is known.
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Identifier of the server-side audit log entry.
    #[serde(default)]
    pub verification_id: i64,
    /// Server-assigned ISO-8601 timestamp.
    #[serde(default)]
    pub timestamp: String,
}

impl VerificationResponse {
    /// The tri-state classification of this response.
    #[must_use]
    pub fn doc_status(&self) -> DocStatus {
        DocStatus::from_server_status(&self.status)
    }
}

/// A verdict ready to be displayed: status plus description.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct VerificationOutcome {
    /// The classification.
    pub status: DocStatus,
    /// Server message, or a description of the failure.
    pub description: String,
}
