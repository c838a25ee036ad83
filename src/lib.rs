//! # Decentra Verify Web
//!
//! Browser client for a credential verification service running as an
//! Internet Computer canister, built with Rust and WebAssembly.
//!
//! ## Architecture
//!
//! - **Backend**: the [`backend::CanisterBackend`] trait, one async method per
//!   canister call
//! - **Transfer**: sequential 1 MiB chunked upload and download with progress
//! - **Preview**: inline rendering of downloaded documents
//! - **State**: theme, current view and session in one [`state::AppState`]
//! - **Views**: controllers for the dashboard, credentials, NFTs,
//!   verification and administration screens
//! - **Browser**: `wasm32`-only glue for downloads, object URLs and
//!   `localStorage`
//!
//! ## Core Features
//!
//! - Upload credentials with duplicate detection and per-chunk progress
//! - Download and preview credentials, reassembled in order
//! - Peer verification: submit, claim, approve or reject requests
//! - Role administration and NFT minting for signed credentials
//!
//! ## Verification Lifecycle
//!
//! ```text
//! unverified ──claim──► claimed ──approve──► verified
//!                          └─────reject────► rejected
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod models;
pub mod preview;
pub mod state;
pub mod transfer;
pub mod utils;
pub mod views;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backend::CanisterBackend;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use transfer::ChunkedTransfer;
