use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Credential file as reported by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub file_type: Option<String>,
    #[serde(rename = "ecdsa_sign")]
    pub ecdsa_sign: Option<String>,
    #[serde(rename = "schnorr_sign")]
    pub schnorr_sign: Option<String>,
    pub chunk_count: u64,
}

impl FileRecord {
    /// Badge shown on credential cards: any ECDSA signature counts.
    pub fn is_signed(&self) -> bool {
        self.ecdsa_sign.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Dashboard statistics only count credentials carrying both signatures.
    pub fn is_fully_signed(&self) -> bool {
        self.is_signed() && self.schnorr_sign.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferMode {
    Uploading,
    Downloading,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Uploading => "Uploading",
            TransferMode::Downloading => "Downloading",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub mode: TransferMode,
    pub file_name: String,
    pub progress: u8,
}

impl TransferProgress {
    pub fn new(mode: TransferMode, file_name: impl Into<String>) -> Self {
        Self {
            mode,
            file_name: file_name.into(),
            progress: 0,
        }
    }

    /// Records that `done` of `total` chunks have gone through.
    ///
    /// The percentage is floored, so 100 is only reached with the last chunk.
    pub fn advance(&mut self, done: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = (done.min(total) * 100 / total) as u8;
        self.progress = self.progress.max(percent);
    }

    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ... {}%", self.mode.as_str(), self.file_name, self.progress)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Verifier,
    Reviewer,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Verifier => "verifier",
            UserRole::Reviewer => "reviewer",
            UserRole::User => "user",
        }
    }

    /// Role picked in the admin form; unrecognised values assign `User`.
    pub fn from_form_value(value: &str) -> Self {
        value.parse().unwrap_or(UserRole::User)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "verifier" => Ok(UserRole::Verifier),
            "reviewer" => Ok(UserRole::Reviewer),
            "user" => Ok(UserRole::User),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRecord {
    pub principal: String,
    pub role: UserRole,
    pub assigned_by: String,
    pub assigned_at: u64,
    pub is_active: bool,
}

/// Lifecycle of a request in the verification pool.
///
/// Transitions are enforced by the backend: unverified requests can be
/// claimed, and only the claimant can move a claimed request to verified
/// or rejected.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[serde(alias = "pending")]
    Unverified,
    Claimed,
    #[serde(alias = "approved")]
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Claimed => "claimed",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "Pending",
            VerificationStatus::Claimed => "Claimed",
            VerificationStatus::Verified => "Approved",
            VerificationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, VerificationStatus::Verified | VerificationStatus::Rejected)
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unverified" | "pending" => Ok(VerificationStatus::Unverified),
            "claimed" => Ok(VerificationStatus::Claimed),
            "verified" | "approved" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    pub credential_name: String,
    pub requester: String,
    pub request_message: String,
    pub status: VerificationStatus,
    pub claimed_by: Option<String>,
    pub verifier_response: Option<String>,
    pub created_at: u64,
    pub processed_at: Option<u64>,
}

impl VerificationRequest {
    pub fn is_claimed_by(&self, principal: &str) -> bool {
        self.status == VerificationStatus::Claimed && self.claimed_by.as_deref() == Some(principal)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub attributes: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Nft {
    pub id: u64,
    pub owner: String,
    pub metadata: NftMetadata,
    pub minted_at: u64,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_floors_and_never_goes_back() {
        let mut progress = TransferProgress::new(TransferMode::Uploading, "a.pdf");
        progress.advance(1, 3);
        assert_eq!(progress.progress, 33);
        progress.advance(2, 3);
        assert_eq!(progress.progress, 66);
        progress.advance(1, 3);
        assert_eq!(progress.progress, 66);
        assert!(!progress.is_complete());
        progress.advance(3, 3);
        assert!(progress.is_complete());
        assert_eq!(progress.to_string(), "Uploading a.pdf ... 100%");
    }

    #[test]
    fn legacy_status_names_parse() {
        let status: VerificationStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, VerificationStatus::Unverified);
        assert_eq!("approved".parse::<VerificationStatus>(), Ok(VerificationStatus::Verified));
        assert!("archived".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn unknown_form_role_falls_back_to_user() {
        assert_eq!(UserRole::from_form_value("reviewer"), UserRole::Reviewer);
        assert_eq!(UserRole::from_form_value("owner"), UserRole::User);
    }

    #[test]
    fn signature_flags() {
        let mut record = FileRecord {
            name: "cert.png".into(),
            size: 10,
            file_type: Some("image/png".into()),
            ecdsa_sign: Some("3045".into()),
            schnorr_sign: None,
            chunk_count: 1,
        };
        assert!(record.is_signed());
        assert!(!record.is_fully_signed());
        record.schnorr_sign = Some("9f1c".into());
        assert!(record.is_fully_signed());
    }
}
