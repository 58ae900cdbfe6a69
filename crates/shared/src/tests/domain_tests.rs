use super::*;

use serde_json::json;

#[test]
fn numeric_ids_are_keyed_as_text() {
    let user: User = serde_json::from_value(json!({"id": 3, "name": "Clementine"})).expect("user");
    assert_eq!(user.id, UserId::new("3"));
}

#[test]
fn unknown_fields_round_trip_untouched() {
    let raw = json!({
        "id": "1",
        "name": "Leanne",
        "email": "leanne@example.test",
        "address": {"city": "Gwenborough"}
    });
    let user: User = serde_json::from_value(raw.clone()).expect("user");
    assert_eq!(user.extra.get("email"), Some(&json!("leanne@example.test")));
    assert_eq!(serde_json::to_value(&user).expect("json"), raw);
}

#[test]
fn drafts_get_distinct_prefixed_ids() {
    let first = User::draft("Carl");
    let second = User::draft("Carl");
    assert!(first.id.is_draft());
    assert_ne!(first.id, second.id);
    assert!(!UserId::new("7").is_draft());
}

#[test]
fn generated_ids_are_not_drafts() {
    let first = UserId::generate();
    assert!(!first.is_draft());
    assert!(!first.is_empty());
    assert_ne!(first, UserId::generate());
}

#[test]
fn names_compare_by_letter_before_case() {
    assert_eq!(compare_names("ann", "Bob"), Ordering::Less);
    assert_eq!(compare_names("Bob", "ann"), Ordering::Greater);
    assert_eq!(compare_names("ann", "Ann"), Ordering::Less);
    assert_eq!(compare_names("Ann", "Ann"), Ordering::Equal);
}

#[test]
fn accented_names_sort_with_their_base_letters() {
    assert_eq!(compare_names("Émile", "Zoe"), Ordering::Less);
    assert_eq!(compare_names("Åsa", "Bob"), Ordering::Less);
    assert_eq!(compare_names("émile", "Emma"), Ordering::Less);
    assert_eq!(compare_names("Zoë", "Émile"), Ordering::Greater);
}

#[test]
fn applying_changes_merges_fields() {
    let mut user: User =
        serde_json::from_value(json!({"id": "1", "name": "Bob", "phone": "555"})).expect("user");
    let mut changes = UserChanges::default();
    changes.extra.insert("email".into(), json!("bob@example.test"));
    user.apply_changes(changes);
    assert_eq!(user.name, "Bob");
    assert_eq!(user.extra.get("phone"), Some(&json!("555")));
    assert_eq!(user.extra.get("email"), Some(&json!("bob@example.test")));

    user.apply_changes(UserChanges::rename("Robert"));
    assert_eq!(user.name, "Robert");
}

#[test]
fn empty_id_has_no_identity() {
    assert!(!User::new("", "Nobody").has_identity());
    assert!(User::new("1", "Somebody").has_identity());
}
