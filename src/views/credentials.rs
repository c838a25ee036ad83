//! # Credentials View
//!
//! Upload, list, download and delete credential files, and mint an NFT for a
//! signed credential. Transfers go through [`ChunkedTransfer`]; while one is
//! running, `progress` holds its state and is cleared when it ends either
//! way.

use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::config::Config;
use crate::constants::NFT_PLACEHOLDER_IMAGE;
use crate::errors::AppError;
use crate::log_data;
use crate::logging::Logger;
use crate::models::{FileRecord, TransferProgress};
use crate::transfer::{ChunkedTransfer, LocalFile, SaveTarget};
use crate::utils::{categorize_content_type, format_size_kb};
use crate::views::ViewStatus;

/// Display data for one credential card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CredentialCard {
    pub name: String,
    pub size: String,
    pub file_type: String,
    pub icon: &'static str,
    pub badge: &'static str,
    pub can_mint: bool,
}

impl From<&FileRecord> for CredentialCard {
    fn from(file: &FileRecord) -> Self {
        let signed = file.is_signed();
        Self {
            name: file.name.clone(),
            size: format_size_kb(file.size),
            file_type: file.file_type.clone().unwrap_or_else(|| "Unknown".to_string()),
            icon: categorize_content_type(file.file_type.as_deref()).icon(),
            badge: if signed { "Verified" } else { "Pending" },
            can_mint: signed,
        }
    }
}

pub struct CredentialsView {
    pub files: Vec<FileRecord>,
    pub status: ViewStatus,
    pub progress: Option<TransferProgress>,
    transfer: ChunkedTransfer,
    logger: Logger,
}

impl CredentialsView {
    pub fn new(config: &Config) -> Self {
        Self {
            files: Vec::new(),
            status: ViewStatus::default(),
            progress: None,
            transfer: ChunkedTransfer::new(config.chunk_size),
            logger: Logger::new("credentials"),
        }
    }

    pub fn cards(&self) -> Vec<CredentialCard> {
        self.files.iter().map(CredentialCard::from).collect()
    }

    pub fn is_transferring(&self) -> bool {
        self.progress.is_some()
    }

    pub async fn load_files<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.get_files().await {
            Ok(files) => self.files = files,
            Err(e) => self.status.fail(
                &self.logger,
                "Failed to load files. Please try again.",
                Some(&e),
            ),
        }
    }

    /// Uploads the picked file; `None` means nothing was selected.
    ///
    /// Returns whether the whole file reached the backend.
    pub async fn upload<B>(&mut self, backend: &B, file: Option<LocalFile>) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();

        let Some(file) = file else {
            let err = AppError::NoFileSelected;
            self.status.fail(&self.logger, err.to_string(), Some(&err));
            return false;
        };

        let result = {
            let progress = &mut self.progress;
            self.transfer
                .upload(backend, &file, &mut |p| *progress = Some(p.clone()))
                .await
        };
        self.progress = None;

        match result {
            Ok(receipt) => {
                self.logger.info(
                    "Credential uploaded",
                    log_data!("fileName" => receipt.name, "sha256" => receipt.sha256),
                );
                self.status
                    .succeed(format!("Successfully uploaded \"{}\"", file.name));
                self.load_files(backend).await;
                true
            }
            Err(e) if e.is_precondition() => {
                self.status.fail(&self.logger, e.to_string(), Some(&e));
                false
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    format!("Failed to upload {}: {}", file.name, e),
                    Some(&e),
                );
                false
            }
        }
    }

    /// Downloads `name` and hands the reassembled file to `target`.
    pub async fn download<B>(&mut self, backend: &B, name: &str, target: &mut dyn SaveTarget) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();

        let result = {
            let progress = &mut self.progress;
            self.transfer
                .download(backend, name, &mut |p| *progress = Some(p.clone()))
                .await
        };
        self.progress = None;

        match result.and_then(|file| target.save(&file)) {
            Ok(()) => {
                self.status
                    .succeed(format!("Successfully downloaded \"{}\"", name));
                true
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    format!("Failed to download {}: {}", name, e),
                    Some(&e),
                );
                false
            }
        }
    }

    /// Deletes `name` once the user has confirmed; unconfirmed requests are
    /// ignored without calling the backend.
    pub async fn delete<B>(&mut self, backend: &B, name: &str, confirmed: bool) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        if !confirmed {
            return false;
        }
        self.status.reset();

        match backend.delete_file(name).await {
            Ok(true) => {
                self.load_files(backend).await;
                self.status.succeed(format!("Successfully deleted \"{}\"", name));
                true
            }
            Ok(false) => {
                self.status.fail(&self.logger, "Failed to delete file", None);
                false
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    format!("Failed to delete {}: {}", name, e),
                    Some(&e),
                );
                false
            }
        }
    }

    /// Mints an NFT for a signed credential.
    pub async fn generate_nft<B>(&mut self, backend: &B, credential_name: &str) -> Option<u64>
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();

        let description = format!("NFT for credential: {}", credential_name);
        let attributes = nft_attributes(credential_name);

        match backend
            .generate_credential_nft(credential_name, &description, NFT_PLACEHOLDER_IMAGE, &attributes)
            .await
        {
            Ok(Some(id)) => {
                self.status
                    .succeed(format!("NFT generated successfully! ID: {}", id));
                Some(id)
            }
            Ok(None) => {
                self.status.fail(
                    &self.logger,
                    "Failed to generate NFT. Make sure the credential exists.",
                    None,
                );
                None
            }
            Err(e) => {
                self.status.fail(
                    &self.logger,
                    format!("Failed to generate NFT: {}", e),
                    Some(&e),
                );
                None
            }
        }
    }
}

fn nft_attributes(credential_name: &str) -> Vec<(String, String)> {
    vec![
        ("Type".to_string(), "Credential".to_string()),
        ("Name".to_string(), credential_name.to_string()),
        ("Verified".to_string(), "true".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCanister;
    use crate::transfer::DownloadedFile;
    use futures::executor::block_on;

    fn view() -> CredentialsView {
        CredentialsView::new(&Config {
            chunk_size: 4,
            ..Config::default()
        })
    }

    #[test]
    fn upload_refreshes_list_and_reports_success() {
        let canister = MemoryCanister::new("alice");
        let mut view = view();
        let file = LocalFile::new("degree.pdf", "application/pdf", b"%PDF-1.7 body".to_vec());

        assert!(block_on(view.upload(&canister, Some(file))));
        assert_eq!(view.status.success.as_deref(), Some("Successfully uploaded \"degree.pdf\""));
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.files[0].chunk_count, 4);
        assert!(view.progress.is_none());

        let cards = view.cards();
        assert_eq!(cards[0].badge, "Pending");
        assert_eq!(cards[0].icon, "📄");
        assert!(!cards[0].can_mint);
    }

    #[test]
    fn missing_selection_sets_error() {
        let canister = MemoryCanister::new("alice");
        let mut view = view();
        assert!(!block_on(view.upload(&canister, None)));
        assert_eq!(view.status.error.as_deref(), Some("Please select a file to upload."));
        assert!(canister.calls().is_empty());
    }

    #[test]
    fn duplicate_upload_sets_conflict_message_once() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"old", 4);
        let mut view = view();
        let file = LocalFile::new("degree.pdf", "application/pdf", b"new content".to_vec());

        assert!(!block_on(view.upload(&canister, Some(file))));
        assert_eq!(
            view.status.error.as_deref(),
            Some("File \"degree.pdf\" already exists. Please choose a different file name.")
        );
        assert_eq!(canister.upload_calls(), 0);
    }

    #[test]
    fn transport_failure_is_prefixed_with_file_name() {
        let canister = MemoryCanister::new("alice");
        canister.fail_upload_at(2);
        let mut view = view();
        let file = LocalFile::new("scan.png", "image/png", vec![7; 12]);

        assert!(!block_on(view.upload(&canister, Some(file))));
        let error = view.status.error.clone().unwrap();
        assert!(error.starts_with("Failed to upload scan.png: "), "{}", error);
        assert_eq!(canister.upload_calls(), 3);
        assert!(view.progress.is_none());
        assert!(view.files.is_empty());
    }

    #[test]
    fn download_hands_file_to_target() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"0123456789", 4);
        let mut view = view();
        let mut saved: Vec<DownloadedFile> = Vec::new();

        assert!(block_on(view.download(&canister, "degree.pdf", &mut saved)));
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].bytes, b"0123456789");
        assert_eq!(view.status.success.as_deref(), Some("Successfully downloaded \"degree.pdf\""));
    }

    #[test]
    fn broken_download_saves_nothing() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"0123456789", 4);
        canister.drop_chunk("degree.pdf", 2);
        let mut view = view();
        let mut saved: Vec<DownloadedFile> = Vec::new();

        assert!(!block_on(view.download(&canister, "degree.pdf", &mut saved)));
        assert!(saved.is_empty());
        assert_eq!(
            view.status.error.as_deref(),
            Some("Failed to download degree.pdf: Failed to retrieve chunk 2")
        );
    }

    #[test]
    fn delete_requires_confirmation() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"abc", 4);
        let mut view = view();

        assert!(!block_on(view.delete(&canister, "degree.pdf", false)));
        assert!(canister.calls().is_empty());

        assert!(block_on(view.delete(&canister, "degree.pdf", true)));
        assert!(view.files.is_empty());
        assert!(canister.stored_bytes("degree.pdf").is_none());

        assert!(!block_on(view.delete(&canister, "degree.pdf", true)));
        assert_eq!(view.status.error.as_deref(), Some("Failed to delete file"));
    }

    #[test]
    fn nft_needs_a_signed_credential() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"abc", 4);
        let mut view = view();

        assert_eq!(block_on(view.generate_nft(&canister, "degree.pdf")), None);
        assert_eq!(
            view.status.error.as_deref(),
            Some("Failed to generate NFT. Make sure the credential exists.")
        );

        canister.sign_file("degree.pdf");
        assert_eq!(block_on(view.generate_nft(&canister, "degree.pdf")), Some(1));
        assert_eq!(view.status.success.as_deref(), Some("NFT generated successfully! ID: 1"));
        assert_eq!(view.status.error, None);
    }
}
