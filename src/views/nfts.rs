use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::constants::SIGNATURE_PREVIEW_LEN;
use crate::logging::Logger;
use crate::models::Nft;
use crate::utils::format_date;
use crate::views::ViewStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NftCard {
    pub title: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub minted: String,
    pub signature_preview: String,
}

impl From<&Nft> for NftCard {
    fn from(nft: &Nft) -> Self {
        Self {
            title: format!("NFT #{}", nft.id),
            name: nft.metadata.name.clone(),
            description: nft.metadata.description.clone(),
            image: nft.metadata.image.clone(),
            attributes: nft.metadata.attributes.clone(),
            minted: format_date(nft.minted_at),
            signature_preview: signature_preview(&nft.signature),
        }
    }
}

fn signature_preview(signature: &str) -> String {
    let head: String = signature.chars().take(SIGNATURE_PREVIEW_LEN).collect();
    if head.len() < signature.len() {
        format!("{}...", head)
    } else {
        head
    }
}

/// The caller's minted credential NFTs.
pub struct NftGallery {
    pub nfts: Vec<Nft>,
    pub status: ViewStatus,
    logger: Logger,
}

impl Default for NftGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl NftGallery {
    pub fn new() -> Self {
        Self {
            nfts: Vec::new(),
            status: ViewStatus::default(),
            logger: Logger::new("nfts"),
        }
    }

    pub fn cards(&self) -> Vec<NftCard> {
        self.nfts.iter().map(NftCard::from).collect()
    }

    pub async fn load<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.loading = true;
        match backend.get_user_nfts().await {
            Ok(nfts) => {
                self.nfts = nfts;
                self.status.dismiss_error();
            }
            Err(e) => self.status.fail(
                &self.logger,
                "Failed to load your NFTs. Please try again.",
                Some(&e),
            ),
        }
        self.status.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCanister;
    use crate::views::CredentialsView;
    use futures::executor::block_on;

    #[test]
    fn minted_nft_shows_in_gallery() {
        let canister = MemoryCanister::new("alice");
        canister.seed_file("degree.pdf", "application/pdf", b"abc", 4);
        canister.sign_file("degree.pdf");
        let mut credentials = CredentialsView::new(&crate::config::Config::default());
        block_on(credentials.generate_nft(&canister, "degree.pdf")).unwrap();

        let mut gallery = NftGallery::new();
        block_on(gallery.load(&canister));
        let cards = gallery.cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "NFT #1");
        assert_eq!(cards[0].description, "NFT for credential: degree.pdf");
        assert_eq!(cards[0].attributes[2], ("Verified".to_string(), "true".to_string()));
        assert!(cards[0].signature_preview.ends_with("..."));
        assert_eq!(cards[0].signature_preview.chars().count(), SIGNATURE_PREVIEW_LEN + 3);
    }

    #[test]
    fn load_failure_sets_message() {
        let canister = MemoryCanister::new("alice");
        canister.fail_method("getUserNFTs");
        let mut gallery = NftGallery::new();
        block_on(gallery.load(&canister));
        assert_eq!(
            gallery.status.error.as_deref(),
            Some("Failed to load your NFTs. Please try again.")
        );
        assert!(!gallery.status.loading);
    }

    #[test]
    fn short_signatures_are_not_truncated() {
        assert_eq!(signature_preview("abc"), "abc");
    }
}
