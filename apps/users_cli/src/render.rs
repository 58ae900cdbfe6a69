//! Plain-text rendering of a store snapshot.

use std::fmt::Write as _;

use client_core::UsersSnapshot;

pub fn render_users(snapshot: &UsersSnapshot, status: Option<&str>) -> String {
    if snapshot.loading {
        return "Loading...\n".to_string();
    }
    if let Some(error) = &snapshot.error {
        return format!("Error: {error}\n");
    }

    let mut out = String::from("Users\n");
    for user in &snapshot.users {
        let _ = writeln!(out, "  {} [{}]", user.name, user.id);
    }
    for draft in &snapshot.pending_drafts {
        let _ = writeln!(out, "  {} [saving...]", draft.name);
    }
    if snapshot.users.is_empty() && snapshot.pending_drafts.is_empty() {
        out.push_str("  (no users)\n");
    }
    if let Some(status) = status {
        let _ = writeln!(out, "\n{status}");
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
