//! # Verification Workflow
//!
//! One controller for both sides of peer review: credential owners submit
//! requests and follow their status, reviewers work the pool. Which actions
//! are offered follows [`Capabilities`] reported by the backend.
//!
//! ```text
//!  unverified ──claim──► claimed ──approve──► verified
//!                           │
//!                           └────reject────► rejected
//! ```
//!
//! The backend owns these transitions. The controller only offers the
//! action that fits the current state, reads the returned boolean, and
//! re-queries the pool afterwards.

use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::config::Config;
use crate::constants::{BACKEND_ERROR_PREFIX, DEFAULT_APPROVE_MESSAGE, DEFAULT_REJECT_MESSAGE};
use crate::errors::AppError;
use crate::log_data;
use crate::logging::Logger;
use crate::models::{FileRecord, TransferProgress, VerificationRequest, VerificationStatus};
use crate::preview::{build_preview_with, data_url, Preview};
use crate::transfer::{ChunkedTransfer, DownloadedFile};
use crate::views::{Capabilities, ViewStatus};

/// Submission form fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequestForm {
    pub credential: String,
    pub message: String,
}

/// Actions offered for one request to the current caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequestActions {
    pub can_claim: bool,
    pub can_decide: bool,
    pub can_preview: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Decision::Approve => DEFAULT_APPROVE_MESSAGE,
            Decision::Reject => DEFAULT_REJECT_MESSAGE,
        }
    }
}

pub struct VerificationWorkflow {
    pub principal: Option<String>,
    pub capabilities: Capabilities,
    pub credentials: Vec<FileRecord>,
    pub submitted: Vec<VerificationRequest>,
    pub pool: Vec<VerificationRequest>,
    pub form: RequestForm,
    pub active_request: Option<String>,
    pub response_message: String,
    pub preview: Option<Preview>,
    pub progress: Option<TransferProgress>,
    pub status: ViewStatus,
    transfer: ChunkedTransfer,
    logger: Logger,
}

impl VerificationWorkflow {
    pub fn new(config: &Config) -> Self {
        Self {
            principal: None,
            capabilities: Capabilities::default(),
            credentials: Vec::new(),
            submitted: Vec::new(),
            pool: Vec::new(),
            form: RequestForm::default(),
            active_request: None,
            response_message: String::new(),
            preview: None,
            progress: None,
            status: ViewStatus::default(),
            transfer: ChunkedTransfer::new(config.chunk_size),
            logger: Logger::new("verification"),
        }
    }

    /// Loads everything the caller is allowed to see.
    pub async fn open<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.loading = true;

        match backend.get_current_user_principal().await {
            Ok(principal) => self.principal = Some(principal),
            Err(e) => self.logger.warn(
                "Could not resolve caller principal",
                log_data!("error" => e.to_string()),
            ),
        }

        self.capabilities = match Capabilities::fetch(backend).await {
            Ok(capabilities) => capabilities,
            Err(e) => {
                self.logger.warn(
                    "Role query failed, treating caller as unprivileged",
                    log_data!("error" => e.to_string()),
                );
                Capabilities::default()
            }
        };

        self.load_credentials(backend).await;
        self.load_submitted(backend).await;
        if self.capabilities.can_review() {
            self.load_pool(backend).await;
        }

        self.status.loading = false;
    }

    pub async fn load_credentials<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.get_files().await {
            Ok(files) => self.credentials = files,
            Err(e) => self
                .status
                .fail(&self.logger, "Failed to load your credentials.", Some(&e)),
        }
    }

    /// Requests submitted by the caller. Failures are only logged.
    pub async fn load_submitted<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.get_user_submitted_requests().await {
            Ok(requests) => self.submitted = requests,
            Err(e) => self.logger.error(
                "Failed to load submitted requests",
                log_data!("error" => e.to_string()),
            ),
        }
    }

    pub async fn load_pool<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.get_verification_requests().await {
            Ok(requests) => self.pool = requests,
            Err(e) => self.status.fail(
                &self.logger,
                "Failed to load verification requests. Please try again.",
                Some(&e),
            ),
        }
    }

    /// Requests in the pool nobody has claimed yet.
    pub fn open_requests(&self) -> impl Iterator<Item = &VerificationRequest> {
        self.pool
            .iter()
            .filter(|r| r.status == VerificationStatus::Unverified)
    }

    /// Requests the caller has claimed and not yet decided.
    pub fn my_claims(&self) -> impl Iterator<Item = &VerificationRequest> {
        let me = self.principal.clone().unwrap_or_default();
        self.pool.iter().filter(move |r| r.is_claimed_by(&me))
    }

    pub fn actions(&self, request: &VerificationRequest) -> RequestActions {
        if !self.capabilities.can_review() {
            return RequestActions::default();
        }
        let me = self.principal.as_deref().unwrap_or_default();
        let mine = request.is_claimed_by(me);
        RequestActions {
            can_claim: request.status == VerificationStatus::Unverified && request.requester != me,
            can_decide: mine,
            can_preview: mine,
        }
    }

    /// Submits the form. Returns the new request id on success.
    pub async fn submit<B>(&mut self, backend: &B) -> Option<String>
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();

        let credential = self.form.credential.trim().to_string();
        let message = self.form.message.trim().to_string();
        if credential.is_empty() || message.is_empty() {
            self.status.fail(
                &self.logger,
                "Please select a credential and provide a request message.",
                None,
            );
            return None;
        }
        if !self.credentials.iter().any(|c| c.name == credential) {
            self.status
                .fail(&self.logger, "Selected credential not found.", None);
            return None;
        }

        self.status.loading = true;
        let result = backend.submit_verification_request(&credential, &message).await;
        self.status.loading = false;

        match result {
            Ok(id) if id.starts_with(BACKEND_ERROR_PREFIX) => {
                let err = AppError::Rejected(id);
                self.status.fail(&self.logger, err.to_string(), Some(&err));
                None
            }
            Ok(id) => {
                self.status.succeed(format!(
                    "Verification request submitted successfully! Request ID: {}",
                    id
                ));
                self.form = RequestForm::default();
                self.load_submitted(backend).await;
                Some(id)
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    "Failed to submit verification request. Please try again.",
                    Some(&e),
                );
                None
            }
        }
    }

    pub async fn claim<B>(&mut self, backend: &B, request_id: &str) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();
        if !self.ensure_reviewer() {
            return false;
        }

        self.status.loading = true;
        let result = backend.claim_verification_request(request_id).await;
        self.status.loading = false;

        match result {
            Ok(true) => {
                self.logger
                    .info("Request claimed", log_data!("requestId" => request_id));
                self.active_request = Some(request_id.to_string());
                self.load_pool(backend).await;
                true
            }
            Ok(false) => {
                self.status.fail(
                    &self.logger,
                    "Failed to claim request. It may already be claimed by another reviewer.",
                    None,
                );
                self.load_pool(backend).await;
                false
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    "Failed to claim request. Please try again.",
                    Some(&e),
                );
                false
            }
        }
    }

    pub async fn approve<B>(&mut self, backend: &B, request_id: &str) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.decide(backend, request_id, Decision::Approve).await
    }

    pub async fn reject<B>(&mut self, backend: &B, request_id: &str) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.decide(backend, request_id, Decision::Reject).await
    }

    async fn decide<B>(&mut self, backend: &B, request_id: &str, decision: Decision) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();
        if !self.ensure_reviewer() {
            return false;
        }

        let message = match self.response_message.trim() {
            "" => decision.default_message().to_string(),
            text => text.to_string(),
        };

        self.status.loading = true;
        let result = match decision {
            Decision::Approve => backend.approve_verification_request(request_id, &message).await,
            Decision::Reject => backend.reject_verification_request(request_id, &message).await,
        };
        self.status.loading = false;

        let failure = format!("Failed to {} request. Please try again.", decision.verb());
        match result {
            Ok(true) => {
                self.logger.info(
                    "Request decided",
                    log_data!("requestId" => request_id, "decision" => decision.verb()),
                );
                self.response_message.clear();
                self.active_request = None;
                self.preview = None;
                self.load_pool(backend).await;
                true
            }
            Ok(false) => {
                self.status.fail(&self.logger, failure, None);
                false
            }
            Err(e) => {
                self.status.fail(&self.logger, failure, Some(&e));
                false
            }
        }
    }

    /// Downloads the document behind a claimed request and renders it
    /// inline, embedding renderable types as `data:` URLs.
    pub async fn preview_document<B>(&mut self, backend: &B, request_id: &str) -> Option<Preview>
    where
        B: CanisterBackend + ?Sized,
    {
        self.preview_document_with(backend, request_id, |file| {
            data_url(&file.mime_type, &file.bytes)
        })
        .await
    }

    /// Like [`preview_document`](Self::preview_document), with a custom URL
    /// builder such as a browser object URL.
    pub async fn preview_document_with<B, F>(
        &mut self,
        backend: &B,
        request_id: &str,
        make_url: F,
    ) -> Option<Preview>
    where
        B: CanisterBackend + ?Sized,
        F: FnOnce(&DownloadedFile) -> String,
    {
        self.status.reset();

        let Some(request) = self.pool.iter().find(|r| r.id == request_id).cloned() else {
            self.status
                .fail(&self.logger, "Verification request not found.", None);
            return None;
        };
        if !self.actions(&request).can_preview {
            let err = AppError::Unauthorized("claim the request before opening its document".into());
            self.status.fail(&self.logger, err.to_string(), Some(&err));
            return None;
        }

        let result = {
            let progress = &mut self.progress;
            self.transfer
                .download(backend, &request.credential_name, &mut |p| {
                    *progress = Some(p.clone())
                })
                .await
        };
        self.progress = None;

        match result {
            Ok(file) => {
                let preview = build_preview_with(&file, make_url);
                self.preview = Some(preview.clone());
                Some(preview)
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    format!("Failed to load document {}: {}", request.credential_name, e),
                    Some(&e),
                );
                None
            }
        }
    }

    fn ensure_reviewer(&mut self) -> bool {
        if self.capabilities.can_review() {
            return true;
        }
        let err = AppError::Unauthorized("reviewer role required".into());
        self.status.fail(&self.logger, err.to_string(), Some(&err));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::preview::PreviewKind;
    use crate::testing::MemoryCanister;
    use futures::executor::block_on;

    const OWNER: &str = "owner-principal";
    const REVIEWER: &str = "reviewer-principal";

    fn config() -> Config {
        Config {
            chunk_size: 4,
            ..Config::default()
        }
    }

    fn submitted_request(canister: &MemoryCanister) -> String {
        canister.set_caller(OWNER);
        canister.seed_file("degree.txt", "text/plain", b"BSc Computer Science", 4);
        let mut owner = VerificationWorkflow::new(&config());
        block_on(owner.open(canister));
        owner.form = RequestForm {
            credential: "degree.txt".into(),
            message: "Needed for a job application".into(),
        };
        block_on(owner.submit(canister)).unwrap()
    }

    fn reviewer(canister: &MemoryCanister) -> VerificationWorkflow {
        canister.grant(REVIEWER, UserRole::Verifier);
        canister.set_caller(REVIEWER);
        let mut workflow = VerificationWorkflow::new(&config());
        block_on(workflow.open(canister));
        workflow
    }

    #[test]
    fn submit_validates_form_before_calling_backend() {
        let canister = MemoryCanister::new(OWNER);
        let mut workflow = VerificationWorkflow::new(&config());
        block_on(workflow.open(&canister));
        canister.clear_calls();

        assert_eq!(block_on(workflow.submit(&canister)), None);
        assert_eq!(
            workflow.status.error.as_deref(),
            Some("Please select a credential and provide a request message.")
        );

        workflow.form = RequestForm {
            credential: "ghost.pdf".into(),
            message: "please".into(),
        };
        assert_eq!(block_on(workflow.submit(&canister)), None);
        assert_eq!(workflow.status.error.as_deref(), Some("Selected credential not found."));
        assert!(canister.calls().is_empty());
    }

    #[test]
    fn submit_success_clears_form_and_lists_request() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);

        let mut owner = VerificationWorkflow::new(&config());
        block_on(owner.open(&canister));
        assert_eq!(owner.submitted.len(), 1);
        assert_eq!(owner.submitted[0].id, id);
        assert_eq!(owner.submitted[0].status, VerificationStatus::Unverified);
        assert!(!owner.capabilities.can_review());
        assert!(owner.pool.is_empty());
    }

    #[test]
    fn backend_error_prefix_is_shown_verbatim() {
        let canister = MemoryCanister::new(OWNER);
        submitted_request(&canister);

        let mut owner = VerificationWorkflow::new(&config());
        block_on(owner.open(&canister));
        owner.form = RequestForm {
            credential: "degree.txt".into(),
            message: "again".into(),
        };
        assert_eq!(block_on(owner.submit(&canister)), None);
        assert_eq!(
            owner.status.error.as_deref(),
            Some("ERROR: A request for this credential is already open")
        );
    }

    #[test]
    fn reviewer_claims_then_approves() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut workflow = reviewer(&canister);

        assert_eq!(workflow.open_requests().count(), 1);
        let request = workflow.pool[0].clone();
        assert_eq!(
            workflow.actions(&request),
            RequestActions {
                can_claim: true,
                can_decide: false,
                can_preview: false
            }
        );

        assert!(block_on(workflow.claim(&canister, &id)));
        assert_eq!(workflow.my_claims().count(), 1);
        assert_eq!(workflow.pool[0].status, VerificationStatus::Claimed);

        assert!(block_on(workflow.approve(&canister, &id)));
        let settled = canister.request(&id).unwrap();
        assert_eq!(settled.status, VerificationStatus::Verified);
        assert_eq!(settled.verifier_response.as_deref(), Some(DEFAULT_APPROVE_MESSAGE));
        assert!(workflow.active_request.is_none());
        assert_eq!(workflow.pool[0].status, VerificationStatus::Verified);
    }

    #[test]
    fn second_claim_is_refused_by_backend() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut first = reviewer(&canister);
        assert!(block_on(first.claim(&canister, &id)));

        canister.grant("second-reviewer", UserRole::Reviewer);
        canister.set_caller("second-reviewer");
        let mut second = VerificationWorkflow::new(&config());
        block_on(second.open(&canister));
        assert!(!block_on(second.claim(&canister, &id)));
        assert_eq!(
            second.status.error.as_deref(),
            Some("Failed to claim request. It may already be claimed by another reviewer.")
        );
        assert_eq!(second.pool[0].status, VerificationStatus::Claimed);
        assert_eq!(second.actions(&second.pool[0]), RequestActions::default());
        assert!(!block_on(second.reject(&canister, &id)));
        assert_eq!(
            second.status.error.as_deref(),
            Some("Failed to reject request. Please try again.")
        );
    }

    #[test]
    fn credential_load_error_survives_pool_reload() {
        let canister = MemoryCanister::new(OWNER);
        submitted_request(&canister);
        canister.fail_method("getFiles");
        let workflow = reviewer(&canister);

        assert_eq!(workflow.pool.len(), 1);
        assert_eq!(
            workflow.status.error.as_deref(),
            Some("Failed to load your credentials.")
        );
    }

    #[test]
    fn reject_uses_reviewer_message() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut workflow = reviewer(&canister);
        assert!(block_on(workflow.claim(&canister, &id)));

        workflow.response_message = "Scan is illegible".into();
        assert!(block_on(workflow.reject(&canister, &id)));
        let settled = canister.request(&id).unwrap();
        assert_eq!(settled.status, VerificationStatus::Rejected);
        assert_eq!(settled.verifier_response.as_deref(), Some("Scan is illegible"));
        assert!(workflow.response_message.is_empty());
    }

    #[test]
    fn non_reviewers_cannot_act() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut owner = VerificationWorkflow::new(&config());
        block_on(owner.open(&canister));
        canister.clear_calls();

        assert!(!block_on(owner.claim(&canister, &id)));
        assert_eq!(
            owner.status.error.as_deref(),
            Some("Unauthorized: reviewer role required")
        );
        assert!(canister.calls().is_empty());
    }

    #[test]
    fn claimed_document_previews_inline() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut workflow = reviewer(&canister);

        assert_eq!(block_on(workflow.preview_document(&canister, &id)), None);
        assert!(workflow.status.error.is_some());

        assert!(block_on(workflow.claim(&canister, &id)));
        let preview = block_on(workflow.preview_document(&canister, &id)).unwrap();
        assert_eq!(preview.kind(), PreviewKind::Text);
        assert_eq!(
            preview,
            Preview::Text {
                name: "degree.txt".into(),
                content: "BSc Computer Science".into()
            }
        );
        assert!(workflow.progress.is_none());
    }

    #[test]
    fn broken_document_produces_no_preview() {
        let canister = MemoryCanister::new(OWNER);
        let id = submitted_request(&canister);
        let mut workflow = reviewer(&canister);
        assert!(block_on(workflow.claim(&canister, &id)));

        canister.drop_chunk("degree.txt", 3);
        assert_eq!(block_on(workflow.preview_document(&canister, &id)), None);
        assert_eq!(
            workflow.status.error.as_deref(),
            Some("Failed to load document degree.txt: Failed to retrieve chunk 3")
        );
        assert!(workflow.preview.is_none());
    }
}
