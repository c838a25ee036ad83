//! # Backend Actor Boundary
//!
//! Every piece of business logic lives in the backend canister: chunk
//! storage, signing, role enforcement and the verification pool. The client
//! reaches it through this trait, one async method per RPC. Production
//! builds implement it over the generated agent stubs; tests use
//! [`crate::testing::MemoryCanister`].
//!
//! Calls return plain booleans, optional values or record lists, exactly as
//! the canister interface does. Transport failures are reported as
//! [`AppError::Backend`](crate::errors::AppError::Backend).

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{FileRecord, Nft, UserRole, UserRoleRecord, VerificationRequest};

#[async_trait(?Send)]
pub trait CanisterBackend {
    // Credential files
    async fn check_file_exists(&self, name: &str) -> AppResult<bool>;
    async fn upload_file_chunk(
        &self,
        name: &str,
        chunk: &[u8],
        index: u64,
        file_type: &str,
    ) -> AppResult<()>;
    async fn get_total_chunks(&self, name: &str) -> AppResult<u64>;
    async fn get_file_type(&self, name: &str) -> AppResult<Option<String>>;
    async fn get_file_chunk(&self, name: &str, index: u64) -> AppResult<Option<Vec<u8>>>;
    async fn delete_file(&self, name: &str) -> AppResult<bool>;
    async fn get_files(&self) -> AppResult<Vec<FileRecord>>;

    // Identity and roles
    async fn get_current_user_principal(&self) -> AppResult<String>;
    async fn is_current_user_admin(&self) -> AppResult<bool>;
    async fn is_current_user_verifier(&self) -> AppResult<bool>;
    async fn is_current_user_reviewer(&self) -> AppResult<bool>;
    async fn list_users_with_roles(&self) -> AppResult<Vec<UserRoleRecord>>;
    async fn assign_user_role(&self, principal: &str, role: UserRole) -> AppResult<bool>;
    async fn revoke_user_role(&self, principal: &str) -> AppResult<bool>;
    async fn claim_super_admin(&self) -> AppResult<bool>;

    // Verification pool
    async fn submit_verification_request(
        &self,
        credential_name: &str,
        message: &str,
    ) -> AppResult<String>;
    async fn get_verification_requests(&self) -> AppResult<Vec<VerificationRequest>>;
    async fn get_user_submitted_requests(&self) -> AppResult<Vec<VerificationRequest>>;
    async fn claim_verification_request(&self, request_id: &str) -> AppResult<bool>;
    async fn approve_verification_request(&self, request_id: &str, message: &str)
        -> AppResult<bool>;
    async fn reject_verification_request(&self, request_id: &str, message: &str)
        -> AppResult<bool>;

    // NFTs
    async fn generate_credential_nft(
        &self,
        credential_name: &str,
        description: &str,
        image_url: &str,
        attributes: &[(String, String)],
    ) -> AppResult<Option<u64>>;
    async fn get_user_nfts(&self) -> AppResult<Vec<Nft>>;
}
