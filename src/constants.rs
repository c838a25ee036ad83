//! # Application Constants
//!
//! This module defines application-wide constants used throughout the
//! verification client. Centralizing constants keeps the user-facing messages
//! and backend conventions consistent across the view controllers.
//!
//! ## Transfer
//!
//! Chunk size and MIME fallbacks used by the upload and download flows.
//!
//! ## Identity Provider
//!
//! Login endpoints selected by the deployment network flag.
//!
//! ## Messages
//!
//! Default texts sent to the backend or shown to the user.

/// Default transfer chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// MIME type used when the backend has no declared type for a file
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Network flag value naming the public Internet Computer
pub const MAINNET_NETWORK_FLAG: &str = "ic";

/// Identity provider for the public network
pub const MAINNET_IDENTITY_PROVIDER: &str = "https://identity.ic0.app";

/// Identity provider served by a local replica
pub const LOCAL_IDENTITY_PROVIDER: &str = "http://rdmx6-jaaaa-aaaaa-aaadq-cai.localhost:4943";

/// Prefix the backend uses to encode a failed request submission
pub const BACKEND_ERROR_PREFIX: &str = "ERROR:";

/// Reviewer response sent when an approval carries no message
pub const DEFAULT_APPROVE_MESSAGE: &str = "Verification request approved.";

/// Reviewer response sent when a rejection carries no message
pub const DEFAULT_REJECT_MESSAGE: &str = "Verification request rejected.";

/// Image attached to generated credential NFTs
pub const NFT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x400?text=Credential+NFT";

/// Number of credentials shown in the dashboard's recent list
pub const RECENT_CREDENTIALS_LIMIT: usize = 3;

/// Principals longer than this are shortened for display
pub const PRINCIPAL_DISPLAY_LIMIT: usize = 20;

/// Characters kept on each side of a shortened principal
pub const PRINCIPAL_DISPLAY_EDGE: usize = 10;

/// Characters of an NFT signature shown in the gallery
pub const SIGNATURE_PREVIEW_LEN: usize = 20;

/// Browser storage key for the theme preference
pub const THEME_STORAGE_KEY: &str = "theme";
