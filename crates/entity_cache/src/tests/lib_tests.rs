use super::*;

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Contact {
    id: String,
    name: String,
}

struct Rename(String);

impl Entity for Contact {
    type Id = String;
    type Changes = Rename;

    fn id(&self) -> &String {
        &self.id
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }

    fn apply_changes(&mut self, changes: Rename) {
        self.name = changes.0;
    }

    fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }
}

fn contact(id: &str, name: &str) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn names(cache: &EntityCache<Contact>) -> Vec<&str> {
    cache.all_sorted().map(|c| c.name.as_str()).collect()
}

fn assert_sorted(cache: &EntityCache<Contact>) {
    let sorted: Vec<&Contact> = cache.all_sorted().collect();
    assert_eq!(sorted.len(), cache.len());
    assert!(
        sorted.windows(2).all(|pair| pair[0].name <= pair[1].name),
        "read view out of order: {:?}",
        names(cache)
    );
}

#[test]
fn upserted_entity_is_readable_by_id() {
    let mut cache = EntityCache::new();
    let carl = contact("7", "Carl");
    assert!(cache.upsert_one(carl.clone()));
    assert_eq!(cache.by_id(&"7".to_string()), Some(&carl));
}

#[test]
fn read_view_is_sorted_by_name_not_insertion() {
    let mut cache = EntityCache::new();
    cache.upsert_many([contact("1", "Bob"), contact("2", "Ann"), contact("3", "Cid")]);
    assert_eq!(names(&cache), ["Ann", "Bob", "Cid"]);
    assert_eq!(cache.ids(), ["2", "1", "3"]);
}

#[test]
fn upsert_replaces_full_record_and_resorts() {
    let mut cache = EntityCache::new();
    cache.upsert_many([contact("1", "Bob"), contact("2", "Ann")]);
    cache.upsert_one(contact("2", "Zed"));
    assert_eq!(cache.len(), 2);
    assert_eq!(names(&cache), ["Bob", "Zed"]);
}

#[test]
fn upsert_many_is_idempotent() {
    let batch = [contact("1", "Bob"), contact("2", "Ann"), contact("3", "Ann")];
    let mut once = EntityCache::new();
    once.upsert_many(batch.clone());
    let mut twice = EntityCache::new();
    twice.upsert_many(batch.clone());
    twice.upsert_many(batch);

    let once_view: Vec<Contact> = once.all_sorted().cloned().collect();
    let twice_view: Vec<Contact> = twice.all_sorted().cloned().collect();
    assert_eq!(once_view, twice_view);
}

#[test]
fn equal_names_keep_write_order() {
    let mut cache = EntityCache::new();
    cache.upsert_many([contact("a", "Sam"), contact("b", "Sam"), contact("c", "Al")]);
    assert_eq!(cache.ids(), ["c", "a", "b"]);
}

#[test]
fn removing_absent_id_is_noop() {
    let mut cache = EntityCache::new();
    cache.upsert_one(contact("1", "Bob"));
    assert!(cache.remove_one(&"missing".to_string()).is_none());
    assert_eq!(cache.len(), 1);

    let removed = cache.remove_one(&"1".to_string());
    assert_eq!(removed, Some(contact("1", "Bob")));
    assert!(cache.is_empty());
    assert!(cache.by_id(&"1".to_string()).is_none());
}

#[test]
fn patch_merges_and_resorts() {
    let mut cache = EntityCache::new();
    cache.upsert_many([contact("1", "Bob"), contact("2", "Ann")]);
    cache
        .patch_one(&"2".to_string(), Rename("Cat".into()))
        .expect("patch");
    assert_eq!(names(&cache), ["Bob", "Cat"]);
}

#[test]
fn patch_of_missing_id_reports_not_found_and_leaves_cache_untouched() {
    let mut cache = EntityCache::new();
    cache.upsert_one(contact("1", "Bob"));
    let err = cache
        .patch_one(&"9".to_string(), Rename("Nope".into()))
        .expect_err("must fail");
    assert_eq!(err, CacheError::NotFound { id: "9".into() });
    assert_eq!(names(&cache), ["Bob"]);
}

#[test]
fn entity_without_identity_is_refused() {
    let mut cache = EntityCache::new();
    assert!(!cache.upsert_one(contact("", "Ghost")));
    assert!(cache.is_empty());
}

#[test]
fn add_one_does_not_overwrite() {
    let mut cache = EntityCache::new();
    assert!(cache.add_one(contact("1", "Bob")));
    assert!(!cache.add_one(contact("1", "Robert")));
    cache.add_many([contact("1", "Bobby"), contact("2", "Ann")]);
    assert_eq!(names(&cache), ["Ann", "Bob"]);
}

#[test]
fn set_all_drops_records_missing_from_input() {
    let mut cache = EntityCache::new();
    cache.upsert_many([contact("1", "Bob"), contact("2", "Ann")]);
    cache.set_all([contact("3", "Dee")]);
    assert_eq!(cache.ids(), ["3"]);
    assert!(cache.by_id(&"1".to_string()).is_none());
}

#[test]
fn mixed_operation_sequence_matches_model() {
    let mut cache = EntityCache::new();
    let mut model: HashMap<String, Contact> = HashMap::new();
    let pool = ["Ann", "bob", "Bob", "Cid", "dee", "Eve", "Ann"];
    let mut seed: u64 = 0x5eed;

    for step in 0..400u64 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let id = format!("{}", (seed >> 33) % 12);
        let name = pool[((seed >> 17) % pool.len() as u64) as usize].to_string();
        match (seed >> 41) % 3 {
            0 => {
                let record = Contact {
                    id: id.clone(),
                    name,
                };
                cache.upsert_one(record.clone());
                model.insert(id.clone(), record);
            }
            1 => {
                cache.remove_one(&id);
                model.remove(&id);
            }
            _ => {
                let patched = cache.patch_one(&id, Rename(name.clone()));
                match model.get_mut(&id) {
                    Some(record) => {
                        patched.expect("patch of known id");
                        record.name = name;
                    }
                    None => assert!(patched.is_err(), "step {step}"),
                }
            }
        }

        assert_sorted(&cache);
        assert_eq!(cache.len(), model.len());
        for (id, record) in &model {
            assert_eq!(cache.by_id(id), Some(record), "step {step}");
        }
    }
}

#[test]
fn cache_state_flags_start_cleared() {
    let mut state: CacheState<Contact> = CacheState::default();
    assert!(!state.loading());
    assert!(state.error().is_none());

    state.set_loading(true);
    state.set_error(Some("network down".into()));
    assert!(state.loading());
    assert_eq!(state.error(), Some("network down"));

    state.entities_mut().upsert_one(contact("1", "Bob"));
    assert_eq!(state.entities().len(), 1);
}
