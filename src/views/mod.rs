//! # View Controllers
//!
//! Each screen of the application is a plain state object plus async
//! operations that call the backend and record the outcome. Markup is left
//! to the rendering layer; it reads these fields and calls these methods.
//!
//! All controllers share [`ViewStatus`] for the loading/error/success flags.
//! Backend failures never escape a controller: they are logged and turned
//! into a user-visible message, and the next action starts from a clean
//! status.

use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::errors::AppError;
use crate::log_data;
use crate::logging::Logger;

pub mod admin;
pub mod credentials;
pub mod dashboard;
pub mod nfts;
pub mod sidebar;
pub mod verification;

pub use admin::AdminPanel;
pub use credentials::CredentialsView;
pub use dashboard::DashboardView;
pub use nfts::NftGallery;
pub use sidebar::{HeaderView, SidebarView};
pub use verification::VerificationWorkflow;

/// Loading/error/success flags shown by every view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ViewStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ViewStatus {
    /// Clears both messages before a new user action.
    pub fn reset(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.error = None;
        self.success = Some(message.into());
    }

    /// Records `message` for the user and logs the underlying cause.
    pub fn fail(&mut self, logger: &Logger, message: impl Into<String>, cause: Option<&AppError>) {
        let message = message.into();
        logger.error(
            &message,
            log_data!("cause" => cause.map(|e| e.to_string())),
        );
        self.success = None;
        self.error = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_success(&mut self) {
        self.success = None;
    }
}

/// What the current caller may do, as reported by the backend's role queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub is_admin: bool,
    pub is_verifier: bool,
    pub is_reviewer: bool,
}

impl Capabilities {
    /// Queries all three role flags. Any failure is returned to the caller,
    /// which treats it as "no privileges".
    pub async fn fetch<B>(backend: &B) -> Result<Self, AppError>
    where
        B: CanisterBackend + ?Sized,
    {
        Ok(Self {
            is_admin: backend.is_current_user_admin().await?,
            is_verifier: backend.is_current_user_verifier().await?,
            is_reviewer: backend.is_current_user_reviewer().await?,
        })
    }

    pub fn can_review(&self) -> bool {
        self.is_admin || self.is_verifier || self.is_reviewer
    }

    pub fn can_administer(&self) -> bool {
        self.is_admin
    }
}
