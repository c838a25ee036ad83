//! Navigation chrome: the sidebar menu, which depends on the caller's roles,
//! and the header with the theme toggle.

use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::logging::Logger;
use crate::state::{AppState, PreferenceStore, Theme, View};
use crate::utils::format_principal;
use crate::views::Capabilities;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub view: View,
    pub label: &'static str,
}

pub struct SidebarView {
    pub principal: Option<String>,
    pub capabilities: Capabilities,
    logger: Logger,
}

impl Default for SidebarView {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarView {
    pub fn new() -> Self {
        Self {
            principal: None,
            capabilities: Capabilities::default(),
            logger: Logger::new("sidebar"),
        }
    }

    /// Refreshes principal and role flags. A failed role query hides every
    /// privileged entry but keeps the principal.
    pub async fn refresh<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.get_current_user_principal().await {
            Ok(principal) => self.principal = Some(principal),
            Err(e) => self.logger.error(
                "Error resolving principal",
                crate::log_data!("error" => e.to_string()),
            ),
        }

        match Capabilities::fetch(backend).await {
            Ok(capabilities) => {
                self.logger.info(
                    "Roles resolved",
                    crate::log_data!(
                        "isAdmin" => capabilities.is_admin,
                        "canReview" => capabilities.can_review()
                    ),
                );
                self.capabilities = capabilities;
            }
            Err(e) => {
                self.logger.error(
                    "Error checking user status",
                    crate::log_data!("error" => e.to_string()),
                );
                self.capabilities = Capabilities::default();
            }
        }
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        let mut items = vec![
            MenuItem { view: View::Dashboard, label: "Dashboard" },
            MenuItem { view: View::Credentials, label: "Upload & Manage" },
            MenuItem { view: View::Nfts, label: "My NFTs" },
        ];
        if self.capabilities.can_review() {
            items.push(MenuItem {
                view: View::VerificationRequests,
                label: "Verification Requests",
            });
        }
        items.push(MenuItem {
            view: View::RequestVerification,
            label: "Request Verification",
        });
        if self.capabilities.can_administer() {
            items.push(MenuItem { view: View::Admin, label: "Admin Panel" });
        }
        items
    }

    /// Navigates to `view` if it is on the menu; returns whether it was.
    pub fn select(&self, state: &mut AppState, view: View) -> bool {
        if self.menu().iter().any(|item| item.view == view) {
            state.navigate(view);
            true
        } else {
            false
        }
    }
}

/// Top bar: user label and theme switch.
pub struct HeaderView;

impl HeaderView {
    pub fn user_label(state: &AppState) -> String {
        state
            .session
            .principal
            .as_deref()
            .map(format_principal)
            .unwrap_or_else(|| "Anonymous".to_string())
    }

    pub fn toggle_theme(state: &mut AppState, store: &mut dyn PreferenceStore) -> Theme {
        state.toggle_theme(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::UserRole;
    use crate::testing::MemoryCanister;
    use futures::executor::block_on;
    use std::collections::HashMap;

    fn views(menu: &[MenuItem]) -> Vec<View> {
        menu.iter().map(|item| item.view).collect()
    }

    #[test]
    fn plain_users_see_base_menu() {
        let canister = MemoryCanister::new("alice");
        let mut sidebar = SidebarView::new();
        block_on(sidebar.refresh(&canister));
        assert_eq!(
            views(&sidebar.menu()),
            vec![
                View::Dashboard,
                View::Credentials,
                View::Nfts,
                View::RequestVerification
            ]
        );
    }

    #[test]
    fn reviewers_and_admins_get_extra_entries() {
        let canister = MemoryCanister::new("bob");
        canister.grant("bob", UserRole::Reviewer);
        let mut sidebar = SidebarView::new();
        block_on(sidebar.refresh(&canister));
        assert!(views(&sidebar.menu()).contains(&View::VerificationRequests));
        assert!(!views(&sidebar.menu()).contains(&View::Admin));

        canister.grant("bob", UserRole::Admin);
        block_on(sidebar.refresh(&canister));
        assert!(views(&sidebar.menu()).contains(&View::VerificationRequests));
        assert!(views(&sidebar.menu()).contains(&View::Admin));
    }

    #[test]
    fn role_query_failure_hides_privileged_entries() {
        let canister = MemoryCanister::new("carol");
        canister.grant("carol", UserRole::Admin);
        let mut sidebar = SidebarView::new();
        block_on(sidebar.refresh(&canister));
        assert!(sidebar.capabilities.can_administer());

        canister.fail_method("isCurrentUserReviewer");
        block_on(sidebar.refresh(&canister));
        assert_eq!(sidebar.capabilities, Capabilities::default());
        assert_eq!(sidebar.menu().len(), 4);
    }

    #[test]
    fn principal_is_kept_when_role_query_fails() {
        let canister = MemoryCanister::new("dave");
        canister.fail_method("isCurrentUserAdmin");
        let mut sidebar = SidebarView::new();
        block_on(sidebar.refresh(&canister));
        assert_eq!(sidebar.principal.as_deref(), Some("dave"));
        assert!(!sidebar.capabilities.can_review());
    }

    #[test]
    fn selecting_hidden_view_is_refused() {
        let sidebar = SidebarView::new();
        let mut state = AppState::new(Config::default());
        assert!(!sidebar.select(&mut state, View::Admin));
        assert_eq!(state.view, View::Dashboard);
        assert!(sidebar.select(&mut state, View::Credentials));
        assert_eq!(state.view, View::Credentials);
    }

    #[test]
    fn header_shortens_principal_and_toggles_theme() {
        let mut state = AppState::new(Config::default());
        assert_eq!(HeaderView::user_label(&state), "Anonymous");
        state.sign_in("abcdefghij0123456789KLMNOPQRST");
        assert_eq!(HeaderView::user_label(&state), "abcdefghij...KLMNOPQRST");

        let mut store: HashMap<String, String> = HashMap::new();
        assert_eq!(HeaderView::toggle_theme(&mut state, &mut store), Theme::Light);
        assert_eq!(store.get("theme").map(String::as_str), Some("light"));
    }
}
