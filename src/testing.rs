//! In-memory canister for tests.
//!
//! Available behind the `test-util` feature or in `#[cfg(test)]`. Implements
//! the backend contract the client relies on (append-by-index chunk storage,
//! per-caller roles, the verification pool state machine and NFT minting),
//! records every call, and lets tests inject failures.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::backend::CanisterBackend;
use crate::errors::{AppError, AppResult};
use crate::models::{
    FileRecord, Nft, NftMetadata, UserRole, UserRoleRecord, VerificationRequest,
    VerificationStatus,
};
use crate::utils::sha256_hex;

/// A backend call as observed by [`MemoryCanister`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CheckExists { name: String },
    UploadChunk { name: String, index: u64, len: usize, file_type: String },
    GetTotalChunks { name: String },
    GetFileType { name: String },
    GetChunk { name: String, index: u64 },
    Delete { name: String },
    Other(&'static str),
}

#[derive(Clone, Debug)]
struct StoredFile {
    owner: String,
    file_type: String,
    chunks: Vec<Vec<u8>>,
    ecdsa_sign: Option<String>,
    schnorr_sign: Option<String>,
}

impl StoredFile {
    fn record(&self, name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            size: self.chunks.iter().map(|c| c.len() as u64).sum(),
            file_type: Some(self.file_type.clone()).filter(|t| !t.is_empty()),
            ecdsa_sign: self.ecdsa_sign.clone(),
            schnorr_sign: self.schnorr_sign.clone(),
            chunk_count: self.chunks.len() as u64,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    caller: String,
    files: BTreeMap<String, StoredFile>,
    roles: BTreeMap<String, UserRoleRecord>,
    requests: Vec<VerificationRequest>,
    nfts: Vec<Nft>,
    clock: u64,
    calls: Vec<Call>,
    fail_upload_at: Option<u64>,
    failing: HashSet<&'static str>,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1_000_000_000;
        self.clock
    }

    fn role_of(&self, principal: &str) -> Option<UserRole> {
        self.roles
            .get(principal)
            .filter(|r| r.is_active)
            .map(|r| r.role)
    }

    fn caller_has(&self, role: UserRole) -> bool {
        self.role_of(&self.caller) == Some(role)
    }

    fn caller_can_review(&self) -> bool {
        matches!(
            self.role_of(&self.caller),
            Some(UserRole::Admin | UserRole::Verifier | UserRole::Reviewer)
        )
    }
}

/// Single-threaded fake of the backend canister.
#[derive(Debug)]
pub struct MemoryCanister {
    state: RefCell<State>,
}

impl MemoryCanister {
    /// Creates an empty canister where `caller` is the authenticated principal.
    pub fn new(caller: &str) -> Self {
        Self {
            state: RefCell::new(State {
                caller: caller.to_string(),
                clock: 1_705_314_600 * 1_000_000_000,
                ..State::default()
            }),
        }
    }

    /// Switches the authenticated principal.
    pub fn set_caller(&self, caller: &str) {
        self.state.borrow_mut().caller = caller.to_string();
    }

    /// Grants `role` directly, bypassing the admin check.
    pub fn grant(&self, principal: &str, role: UserRole) {
        let mut state = self.state.borrow_mut();
        let assigned_at = state.tick();
        state.roles.insert(
            principal.to_string(),
            UserRoleRecord {
                principal: principal.to_string(),
                role,
                assigned_by: principal.to_string(),
                assigned_at,
                is_active: true,
            },
        );
    }

    /// Stores `content` for the current caller split into `chunk_size` chunks.
    pub fn seed_file(&self, name: &str, file_type: &str, content: &[u8], chunk_size: usize) {
        let mut state = self.state.borrow_mut();
        let owner = state.caller.clone();
        state.files.insert(
            name.to_string(),
            StoredFile {
                owner,
                file_type: file_type.to_string(),
                chunks: content.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect(),
                ecdsa_sign: None,
                schnorr_sign: None,
            },
        );
    }

    /// Marks a stored file as signed by both schemes.
    pub fn sign_file(&self, name: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(file) = state.files.get_mut(name) {
            let digest = sha256_hex(&file.chunks.concat());
            file.ecdsa_sign = Some(format!("ecdsa:{}", digest));
            file.schnorr_sign = Some(format!("schnorr:{}", digest));
        }
    }

    /// Makes the next fetch of `index` come back empty.
    pub fn drop_chunk(&self, name: &str, index: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(chunk) = state
            .files
            .get_mut(name)
            .and_then(|f| f.chunks.get_mut(index))
        {
            chunk.clear();
        }
    }

    /// Rejects the chunk upload carrying `index`.
    pub fn fail_upload_at(&self, index: u64) {
        self.state.borrow_mut().fail_upload_at = Some(index);
    }

    /// Makes every call to `method` fail with a transport error.
    pub fn fail_method(&self, method: &'static str) {
        self.state.borrow_mut().failing.insert(method);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn upload_calls(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::UploadChunk { .. }))
            .count()
    }

    pub fn stored_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(name).map(|f| f.chunks.concat())
    }

    pub fn stored_type(&self, name: &str) -> Option<String> {
        self.state.borrow().files.get(name).map(|f| f.file_type.clone())
    }

    pub fn request(&self, id: &str) -> Option<VerificationRequest> {
        self.state.borrow().requests.iter().find(|r| r.id == id).cloned()
    }

    fn enter(&self, method: &'static str, call: Call) -> AppResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.failing.contains(method) {
            return Err(AppError::backend(format!("Call to {} failed: replica unavailable", method)));
        }
        Ok(())
    }

    fn settle(&self, request_id: &str, status: VerificationStatus, message: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let now = state.tick();
        let caller = state.caller.clone();
        if !state.caller_can_review() {
            return false;
        }

        let Some(request) = state
            .requests
            .iter_mut()
            .find(|r| r.id == request_id && r.is_claimed_by(&caller))
        else {
            return false;
        };

        request.status = status;
        request.verifier_response = Some(message.to_string());
        request.processed_at = Some(now);
        let credential = request.credential_name.clone();

        if status == VerificationStatus::Verified {
            drop(state);
            self.sign_file(&credential);
        }
        true
    }
}

#[async_trait(?Send)]
impl CanisterBackend for MemoryCanister {
    async fn check_file_exists(&self, name: &str) -> AppResult<bool> {
        self.enter("checkFileExists", Call::CheckExists { name: name.to_string() })?;
        Ok(self.state.borrow().files.contains_key(name))
    }

    async fn upload_file_chunk(
        &self,
        name: &str,
        chunk: &[u8],
        index: u64,
        file_type: &str,
    ) -> AppResult<()> {
        self.enter(
            "uploadFileChunk",
            Call::UploadChunk {
                name: name.to_string(),
                index,
                len: chunk.len(),
                file_type: file_type.to_string(),
            },
        )?;

        let mut state = self.state.borrow_mut();
        if state.fail_upload_at == Some(index) {
            return Err(AppError::backend(format!(
                "Call to uploadFileChunk failed: chunk {} rejected",
                index
            )));
        }

        let caller = state.caller.clone();
        let file = state.files.entry(name.to_string()).or_insert_with(|| StoredFile {
            owner: caller,
            file_type: file_type.to_string(),
            chunks: Vec::new(),
            ecdsa_sign: None,
            schnorr_sign: None,
        });

        let index = index as usize;
        if index == file.chunks.len() {
            file.chunks.push(chunk.to_vec());
        } else if index < file.chunks.len() {
            file.chunks[index] = chunk.to_vec();
        } else {
            return Err(AppError::backend(format!(
                "chunk {} out of order, expected {}",
                index,
                file.chunks.len()
            )));
        }
        Ok(())
    }

    async fn get_total_chunks(&self, name: &str) -> AppResult<u64> {
        self.enter("getTotalChunks", Call::GetTotalChunks { name: name.to_string() })?;
        Ok(self
            .state
            .borrow()
            .files
            .get(name)
            .map(|f| f.chunks.len() as u64)
            .unwrap_or(0))
    }

    async fn get_file_type(&self, name: &str) -> AppResult<Option<String>> {
        self.enter("getFileType", Call::GetFileType { name: name.to_string() })?;
        Ok(self.state.borrow().files.get(name).map(|f| f.file_type.clone()))
    }

    async fn get_file_chunk(&self, name: &str, index: u64) -> AppResult<Option<Vec<u8>>> {
        self.enter(
            "getFileChunk",
            Call::GetChunk {
                name: name.to_string(),
                index,
            },
        )?;
        Ok(self
            .state
            .borrow()
            .files
            .get(name)
            .and_then(|f| f.chunks.get(index as usize))
            .filter(|c| !c.is_empty())
            .cloned())
    }

    async fn delete_file(&self, name: &str) -> AppResult<bool> {
        self.enter("deleteFile", Call::Delete { name: name.to_string() })?;
        let mut state = self.state.borrow_mut();
        let owned = state
            .files
            .get(name)
            .is_some_and(|f| f.owner == state.caller);
        if owned {
            state.files.remove(name);
        }
        Ok(owned)
    }

    async fn get_files(&self) -> AppResult<Vec<FileRecord>> {
        self.enter("getFiles", Call::Other("getFiles"))?;
        let state = self.state.borrow();
        Ok(state
            .files
            .iter()
            .filter(|(_, f)| f.owner == state.caller)
            .map(|(name, f)| f.record(name))
            .collect())
    }

    async fn get_current_user_principal(&self) -> AppResult<String> {
        self.enter("getCurrentUserPrincipal", Call::Other("getCurrentUserPrincipal"))?;
        Ok(self.state.borrow().caller.clone())
    }

    async fn is_current_user_admin(&self) -> AppResult<bool> {
        self.enter("isCurrentUserAdmin", Call::Other("isCurrentUserAdmin"))?;
        Ok(self.state.borrow().caller_has(UserRole::Admin))
    }

    async fn is_current_user_verifier(&self) -> AppResult<bool> {
        self.enter("isCurrentUserVerifier", Call::Other("isCurrentUserVerifier"))?;
        Ok(self.state.borrow().caller_has(UserRole::Verifier))
    }

    async fn is_current_user_reviewer(&self) -> AppResult<bool> {
        self.enter("isCurrentUserReviewer", Call::Other("isCurrentUserReviewer"))?;
        Ok(self.state.borrow().caller_has(UserRole::Reviewer))
    }

    async fn list_users_with_roles(&self) -> AppResult<Vec<UserRoleRecord>> {
        self.enter("listUsersWithRoles", Call::Other("listUsersWithRoles"))?;
        let state = self.state.borrow();
        if !state.caller_has(UserRole::Admin) {
            return Err(AppError::backend("Unauthorized: admin role required"));
        }
        Ok(state.roles.values().cloned().collect())
    }

    async fn assign_user_role(&self, principal: &str, role: UserRole) -> AppResult<bool> {
        self.enter("assignUserRole", Call::Other("assignUserRole"))?;
        let mut state = self.state.borrow_mut();
        if !state.caller_has(UserRole::Admin) || principal.trim().is_empty() {
            return Ok(false);
        }
        let assigned_at = state.tick();
        let assigned_by = state.caller.clone();
        state.roles.insert(
            principal.to_string(),
            UserRoleRecord {
                principal: principal.to_string(),
                role,
                assigned_by,
                assigned_at,
                is_active: true,
            },
        );
        Ok(true)
    }

    async fn revoke_user_role(&self, principal: &str) -> AppResult<bool> {
        self.enter("revokeUserRole", Call::Other("revokeUserRole"))?;
        let mut state = self.state.borrow_mut();
        if !state.caller_has(UserRole::Admin) {
            return Ok(false);
        }
        match state.roles.get_mut(principal) {
            Some(record) if record.is_active && record.role != UserRole::Admin => {
                record.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_super_admin(&self) -> AppResult<bool> {
        self.enter("claimSuperAdmin", Call::Other("claimSuperAdmin"))?;
        let has_admin = self
            .state
            .borrow()
            .roles
            .values()
            .any(|r| r.role == UserRole::Admin && r.is_active);
        if has_admin {
            return Ok(false);
        }
        let caller = self.state.borrow().caller.clone();
        self.grant(&caller, UserRole::Admin);
        Ok(true)
    }

    async fn submit_verification_request(
        &self,
        credential_name: &str,
        message: &str,
    ) -> AppResult<String> {
        self.enter("submitVerificationRequest", Call::Other("submitVerificationRequest"))?;
        let mut state = self.state.borrow_mut();
        let caller = state.caller.clone();
        let owns = state
            .files
            .get(credential_name)
            .is_some_and(|f| f.owner == caller);
        if !owns {
            return Ok("ERROR: Credential not found".to_string());
        }
        let open = state.requests.iter().any(|r| {
            r.credential_name == credential_name && r.requester == caller && !r.status.is_final()
        });
        if open {
            return Ok("ERROR: A request for this credential is already open".to_string());
        }

        let created_at = state.tick();
        let id = format!("REQ-{}", state.requests.len() + 1);
        state.requests.push(VerificationRequest {
            id: id.clone(),
            credential_name: credential_name.to_string(),
            requester: caller,
            request_message: message.to_string(),
            status: VerificationStatus::Unverified,
            claimed_by: None,
            verifier_response: None,
            created_at,
            processed_at: None,
        });
        Ok(id)
    }

    async fn get_verification_requests(&self) -> AppResult<Vec<VerificationRequest>> {
        self.enter("getVerificationRequests", Call::Other("getVerificationRequests"))?;
        let state = self.state.borrow();
        if !state.caller_can_review() {
            return Err(AppError::backend("Unauthorized: reviewer role required"));
        }
        Ok(state.requests.clone())
    }

    async fn get_user_submitted_requests(&self) -> AppResult<Vec<VerificationRequest>> {
        self.enter("getUserSubmittedRequests", Call::Other("getUserSubmittedRequests"))?;
        let state = self.state.borrow();
        Ok(state
            .requests
            .iter()
            .filter(|r| r.requester == state.caller)
            .cloned()
            .collect())
    }

    async fn claim_verification_request(&self, request_id: &str) -> AppResult<bool> {
        self.enter("claimVerificationRequest", Call::Other("claimVerificationRequest"))?;
        let mut state = self.state.borrow_mut();
        if !state.caller_can_review() {
            return Ok(false);
        }
        let caller = state.caller.clone();
        match state.requests.iter_mut().find(|r| r.id == request_id) {
            Some(request)
                if request.status == VerificationStatus::Unverified
                    && request.requester != caller =>
            {
                request.status = VerificationStatus::Claimed;
                request.claimed_by = Some(caller);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn approve_verification_request(
        &self,
        request_id: &str,
        message: &str,
    ) -> AppResult<bool> {
        self.enter("approveVerificationRequest", Call::Other("approveVerificationRequest"))?;
        Ok(self.settle(request_id, VerificationStatus::Verified, message))
    }

    async fn reject_verification_request(
        &self,
        request_id: &str,
        message: &str,
    ) -> AppResult<bool> {
        self.enter("rejectVerificationRequest", Call::Other("rejectVerificationRequest"))?;
        Ok(self.settle(request_id, VerificationStatus::Rejected, message))
    }

    async fn generate_credential_nft(
        &self,
        credential_name: &str,
        description: &str,
        image_url: &str,
        attributes: &[(String, String)],
    ) -> AppResult<Option<u64>> {
        self.enter("generateCredentialNFT", Call::Other("generateCredentialNFT"))?;
        let mut state = self.state.borrow_mut();
        let caller = state.caller.clone();
        let signature = match state.files.get(credential_name) {
            Some(file) if file.owner == caller => match &file.ecdsa_sign {
                Some(sign) => sign.clone(),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        let minted_at = state.tick();
        let id = state.nfts.len() as u64 + 1;
        state.nfts.push(Nft {
            id,
            owner: caller,
            metadata: NftMetadata {
                name: credential_name.to_string(),
                description: description.to_string(),
                image: Some(image_url.to_string()).filter(|u| !u.is_empty()),
                attributes: attributes.to_vec(),
            },
            minted_at,
            signature,
        });
        Ok(Some(id))
    }

    async fn get_user_nfts(&self) -> AppResult<Vec<Nft>> {
        self.enter("getUserNFTs", Call::Other("getUserNFTs"))?;
        let state = self.state.borrow();
        Ok(state
            .nfts
            .iter()
            .filter(|n| n.owner == state.caller)
            .cloned()
            .collect())
    }
}
