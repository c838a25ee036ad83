//! # Admin Panel
//!
//! Role management for administrators: list users, claim the super-admin
//! seat on a fresh deployment, assign and revoke roles. The backend enforces
//! every rule; this controller only reports outcomes.

use serde::Serialize;

use crate::backend::CanisterBackend;
use crate::logging::Logger;
use crate::models::{UserRole, UserRoleRecord};
use crate::utils::{format_date, format_principal};
use crate::views::ViewStatus;

/// One row of the user table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub principal: String,
    pub principal_label: String,
    pub role: &'static str,
    pub assigned_by: String,
    pub assigned_at: String,
    pub active: bool,
    pub revocable: bool,
}

impl From<&UserRoleRecord> for UserRow {
    fn from(record: &UserRoleRecord) -> Self {
        Self {
            principal: record.principal.clone(),
            principal_label: format_principal(&record.principal),
            role: record.role.as_str(),
            assigned_by: format_principal(&record.assigned_by),
            assigned_at: format_date(record.assigned_at),
            active: record.is_active,
            revocable: record.is_active && record.role != UserRole::Admin,
        }
    }
}

pub struct AdminPanel {
    pub is_admin: bool,
    pub users: Vec<UserRoleRecord>,
    pub status: ViewStatus,
    pub new_user_principal: String,
    pub selected_role: UserRole,
    logger: Logger,
}

impl Default for AdminPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminPanel {
    pub fn new() -> Self {
        Self {
            is_admin: false,
            users: Vec::new(),
            status: ViewStatus {
                loading: true,
                ..ViewStatus::default()
            },
            new_user_principal: String::new(),
            selected_role: UserRole::Verifier,
            logger: Logger::new("admin"),
        }
    }

    pub fn rows(&self) -> Vec<UserRow> {
        self.users.iter().map(UserRow::from).collect()
    }

    /// Picks the role from the form's select value.
    pub fn select_role(&mut self, value: &str) {
        self.selected_role = UserRole::from_form_value(value);
    }

    /// Checks admin status, then loads the user list.
    pub async fn open<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        self.check_admin_status(backend).await;
        if self.is_admin {
            self.load_users(backend).await;
        }
    }

    pub async fn check_admin_status<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.is_current_user_admin().await {
            Ok(is_admin) => {
                self.is_admin = is_admin;
                if !is_admin {
                    self.status.fail(
                        &self.logger,
                        "You don't have admin privileges to access this page.",
                        None,
                    );
                }
            }
            Err(e) => self
                .status
                .fail(&self.logger, "Failed to verify admin status.", Some(&e)),
        }
        self.status.loading = false;
    }

    pub async fn load_users<B>(&mut self, backend: &B)
    where
        B: CanisterBackend + ?Sized,
    {
        match backend.list_users_with_roles().await {
            Ok(users) => self.users = users,
            Err(e) => self
                .status
                .fail(&self.logger, "Failed to load user list.", Some(&e)),
        }
    }

    pub async fn claim_super_admin<B>(&mut self, backend: &B) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();
        match backend.claim_super_admin().await {
            Ok(true) => {
                self.status.succeed("Successfully claimed super admin status!");
                self.is_admin = true;
                self.load_users(backend).await;
                true
            }
            Ok(false) => {
                self.status.fail(
                    &self.logger,
                    "Failed to claim super admin status. There may already be a super admin.",
                    None,
                );
                false
            }
            Err(e) => {
                self.status
                    .fail(&self.logger, "Failed to claim super admin status.", Some(&e));
                false
            }
        }
    }

    /// Assigns the selected role to the principal typed in the form.
    pub async fn assign_role<B>(&mut self, backend: &B) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();
        let principal = self.new_user_principal.trim().to_string();
        if principal.is_empty() {
            self.status
                .fail(&self.logger, "Please enter a valid principal ID.", None);
            return false;
        }

        let role = self.selected_role;
        match backend.assign_user_role(&principal, role).await {
            Ok(true) => {
                self.status
                    .succeed(format!("Successfully assigned {} role to user!", role));
                self.new_user_principal.clear();
                self.load_users(backend).await;
                true
            }
            Ok(false) => {
                self.status.fail(
                    &self.logger,
                    "Failed to assign role. Make sure the principal ID is valid.",
                    None,
                );
                false
            }
            Err(e) => {
                self.status
                    .fail(&self.logger, "Failed to assign role to user.", Some(&e));
                false
            }
        }
    }

    pub async fn revoke_role<B>(&mut self, backend: &B, principal: &str) -> bool
    where
        B: CanisterBackend + ?Sized,
    {
        self.status.reset();
        match backend.revoke_user_role(principal).await {
            Ok(true) => {
                self.status.succeed("Successfully revoked user role!");
                self.load_users(backend).await;
                true
            }
            Ok(false) => {
                self.status
                    .fail(&self.logger, "Failed to revoke user role.", None);
                false
            }
            Err(e) => {
                self.status
                    .fail(&self.logger, "Failed to revoke user role.", Some(&e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCanister;
    use futures::executor::block_on;

    #[test]
    fn non_admin_sees_privilege_error() {
        let canister = MemoryCanister::new("alice");
        let mut panel = AdminPanel::new();
        block_on(panel.open(&canister));
        assert!(!panel.is_admin);
        assert!(!panel.status.loading);
        assert_eq!(
            panel.status.error.as_deref(),
            Some("You don't have admin privileges to access this page.")
        );
        assert!(panel.users.is_empty());
    }

    #[test]
    fn first_claim_wins_second_fails() {
        let canister = MemoryCanister::new("alice");
        let mut panel = AdminPanel::new();
        assert!(block_on(panel.claim_super_admin(&canister)));
        assert!(panel.is_admin);
        assert_eq!(panel.users.len(), 1);

        canister.set_caller("mallory");
        let mut other = AdminPanel::new();
        assert!(!block_on(other.claim_super_admin(&canister)));
        assert_eq!(
            other.status.error.as_deref(),
            Some("Failed to claim super admin status. There may already be a super admin.")
        );
    }

    #[test]
    fn assign_trims_principal_and_reloads() {
        let canister = MemoryCanister::new("root");
        canister.grant("root", UserRole::Admin);
        let mut panel = AdminPanel::new();
        block_on(panel.open(&canister));

        panel.new_user_principal = "   ".to_string();
        assert!(!block_on(panel.assign_role(&canister)));
        assert_eq!(panel.status.error.as_deref(), Some("Please enter a valid principal ID."));

        panel.new_user_principal = "  w7x7r-cok77-xa  ".to_string();
        panel.select_role("reviewer");
        assert!(block_on(panel.assign_role(&canister)));
        assert_eq!(
            panel.status.success.as_deref(),
            Some("Successfully assigned reviewer role to user!")
        );
        assert!(panel.new_user_principal.is_empty());

        let rows = panel.rows();
        let row = rows.iter().find(|r| r.principal == "w7x7r-cok77-xa").unwrap();
        assert_eq!(row.role, "reviewer");
        assert!(row.revocable);
        assert!(!rows.iter().find(|r| r.principal == "root").unwrap().revocable);
    }

    #[test]
    fn revoke_marks_user_inactive() {
        let canister = MemoryCanister::new("root");
        canister.grant("root", UserRole::Admin);
        canister.grant("w7x7r-cok77-xa", UserRole::Verifier);
        let mut panel = AdminPanel::new();
        block_on(panel.open(&canister));

        assert!(block_on(panel.revoke_role(&canister, "w7x7r-cok77-xa")));
        let row = panel
            .rows()
            .into_iter()
            .find(|r| r.principal == "w7x7r-cok77-xa")
            .unwrap();
        assert!(!row.active);

        assert!(!block_on(panel.revoke_role(&canister, "w7x7r-cok77-xa")));
        assert_eq!(panel.status.error.as_deref(), Some("Failed to revoke user role."));
    }
}
