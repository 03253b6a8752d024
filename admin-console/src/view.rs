//! Local view of the user table.

use chrono::{DateTime, Utc};
use roster_common::User;

/// The last fetched user list. After a successful action the affected
/// row is patched in place rather than refetching the whole list.
#[derive(Debug, Default)]
pub struct ViewState {
    users: Vec<User>,
}

impl ViewState {
    pub fn new() -> Self {
        Self { users: Vec::new() }
    }

    pub fn replace(&mut self, users: Vec<User>) {
        self.users = users;
    }

    /// Swap a row for its updated copy. A miss is ignored; the row may
    /// have been removed by an earlier command.
    pub fn apply_update(&mut self, updated: User) {
        if let Some(user) = self.users.iter_mut().find(|u| u.id == updated.id) {
            *user = updated;
        }
    }

    pub fn remove(&mut self, id: i64) {
        self.users.retain(|u| u.id != id);
    }

    pub fn render(&self) -> String {
        if self.users.is_empty() {
            return "No users found\n".to_string();
        }

        let mut out = String::new();
        out.push_str(&format!(
            "{:<6} {:<28} {:<20} {:<7} {:<9} {:<25}\n",
            "ID", "EMAIL", "NAME", "ROLE", "STATUS", "LAST LOGIN"
        ));
        out.push_str(&format!("{}\n", "─".repeat(98)));

        for user in &self.users {
            let email = truncate(user.email.as_deref().unwrap_or("-"), 26);
            let name = truncate(user.display_name.as_deref().unwrap_or("-"), 18);
            let status = if user.is_active { "Active" } else { "Inactive" };
            let last_login = match user.last_login {
                Some(ts) => format_timestamp(ts),
                None => "Never".to_string(),
            };

            out.push_str(&format!(
                "{:<6} {:<28} {:<20} {:<7} {:<9} {:<25}\n",
                user.id, email, name, user.role, status, last_login
            ));
        }

        out
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.len() > max {
        format!("{}...", &value[..max - 3])
    } else {
        value.to_string()
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roster_common::Role;

    fn sample_user(id: i64) -> User {
        User {
            id,
            subject: format!("subject-{}", id),
            email: Some(format!("user{}@example.com", id)),
            display_name: None,
            role: Role::User,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
            last_login: None,
        }
    }

    #[test]
    fn test_render_empty() {
        let view = ViewState::new();
        assert_eq!(view.render(), "No users found\n");
    }

    #[test]
    fn test_render_placeholders() {
        let mut view = ViewState::new();
        view.replace(vec![sample_user(1)]);

        let table = view.render();
        assert!(table.contains("user1@example.com"));
        assert!(table.contains("Never"));
        assert!(table.contains("Active"));
        assert!(table.contains(" - "));
    }

    #[test]
    fn test_render_last_login_and_status() {
        let mut user = sample_user(1);
        user.is_active = false;
        user.last_login = Some(Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap());
        let mut view = ViewState::new();
        view.replace(vec![user]);

        let table = view.render();
        assert!(table.contains("Inactive"));
        assert!(table.contains("2026-08-20 09:30:00 UTC"));
    }

    #[test]
    fn test_apply_update_swaps_row_in_place() {
        let mut view = ViewState::new();
        view.replace(vec![sample_user(1), sample_user(2)]);

        let mut updated = sample_user(2);
        updated.role = Role::Admin;
        updated.is_active = false;
        view.apply_update(updated);

        let table = view.render();
        assert!(table.contains("admin"));
        assert!(table.contains("Inactive"));
        // The untouched row is still there
        assert!(table.contains("user1@example.com"));
    }

    #[test]
    fn test_apply_update_ignores_unknown_id() {
        let mut view = ViewState::new();
        view.replace(vec![sample_user(1)]);
        view.apply_update(sample_user(99));
        assert!(!view.render().contains("user99@example.com"));
    }

    #[test]
    fn test_remove_drops_row() {
        let mut view = ViewState::new();
        view.replace(vec![sample_user(1), sample_user(2)]);
        view.remove(1);

        let table = view.render();
        assert!(!table.contains("user1@example.com"));
        assert!(table.contains("user2@example.com"));
    }

    #[test]
    fn test_remove_all_renders_empty_message() {
        let mut view = ViewState::new();
        view.replace(vec![sample_user(1)]);
        view.remove(1);
        assert_eq!(view.render(), "No users found\n");
    }

    #[test]
    fn test_long_email_is_truncated() {
        let mut user = sample_user(1);
        user.email = Some("a.very.long.address.that.overflows@example.com".to_string());
        let mut view = ViewState::new();
        view.replace(vec![user]);

        let table = view.render();
        assert!(table.contains("..."));
        assert!(!table.contains("overflows@example.com"));
    }
}
