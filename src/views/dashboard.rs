use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::constants::RECENT_CREDENTIALS_LIMIT;
use crate::logging::Logger;
use crate::models::FileRecord;
use crate::utils::categorize_content_type;
use crate::views::ViewStatus;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_credentials: usize,
    pub verified_credentials: usize,
    pub pending_credentials: usize,
    pub nfts_generated: usize,
}

impl DashboardStats {
    pub fn from_files(files: &[FileRecord], nfts_generated: usize) -> Self {
        let total_credentials = files.len();
        let verified_credentials = files.iter().filter(|f| f.is_fully_signed()).count();
        Self {
            total_credentials,
            verified_credentials,
            pending_credentials: total_credentials - verified_credentials,
            nfts_generated,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecentCredential {
    pub title: String,
    pub status: &'static str,
    pub icon: &'static str,
}

impl From<&FileRecord> for RecentCredential {
    fn from(file: &FileRecord) -> Self {
        Self {
            title: file.name.clone(),
            status: if file.is_signed() { "Verified" } else { "Pending" },
            icon: categorize_content_type(file.file_type.as_deref()).icon(),
        }
    }
}

/// Landing page: caller identity, credential statistics and recent uploads.
pub struct DashboardView {
    pub principal: Option<String>,
    pub stats: DashboardStats,
    pub recent: Vec<RecentCredential>,
    pub status: ViewStatus,
    logger: Logger,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardView {
    pub fn new() -> Self {
        Self {
            principal: None,
            stats: DashboardStats::default(),
            recent: Vec::new(),
            status: ViewStatus::default(),
            logger: Logger::new("dashboard"),
        }
    }

    /// Loads principal, files and NFTs. On failure the previous data stays.
    pub async fn load<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.loading = true;

        let loaded = async {
            let principal = backend.get_current_user_principal().await?;
            let files = backend.get_files().await?;
            let nfts = backend.get_user_nfts().await?;
            Ok::<_, crate::errors::AppError>((principal, files, nfts))
        }
        .await;

        match loaded {
            Ok((principal, files, nfts)) => {
                self.principal = Some(principal);
                self.stats = DashboardStats::from_files(&files, nfts.len());
                self.recent = files
                    .iter()
                    .take(RECENT_CREDENTIALS_LIMIT)
                    .map(RecentCredential::from)
                    .collect();
                self.status.dismiss_error();
            }
            Err(e) => self
                .status
                .fail(&self.logger, "Error loading dashboard data", Some(&e)),
        }

        self.status.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCanister;
    use futures::executor::block_on;

    #[test]
    fn stats_count_fully_signed_credentials() {
        let canister = MemoryCanister::new("alice");
        for name in ["a.pdf", "b.png", "c.txt", "d.pdf"] {
            canister.seed_file(name, "application/pdf", b"data", 4);
        }
        canister.sign_file("b.png");

        let mut view = DashboardView::new();
        block_on(view.load(&canister));

        assert_eq!(view.principal.as_deref(), Some("alice"));
        assert_eq!(
            view.stats,
            DashboardStats {
                total_credentials: 4,
                verified_credentials: 1,
                pending_credentials: 3,
                nfts_generated: 0,
            }
        );
        assert_eq!(view.recent.len(), 3);
        assert_eq!(view.recent[1].status, "Verified");
        assert!(!view.status.loading);
    }

    #[test]
    fn failure_keeps_previous_data() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("a.pdf", "application/pdf", b"data", 4);
        let mut view = DashboardView::new();
        block_on(view.load(&canister));

        canister.fail_method("getUserNFTs");
        block_on(view.load(&canister));
        assert_eq!(view.stats.total_credentials, 1);
        assert_eq!(view.status.error.as_deref(), Some("Error loading dashboard data"));
    }
}
