use std::{cell::RefCell, cmp::Ordering, fmt};

use entity_cache::Entity;
use feruca::Collator;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

const DRAFT_ID_PREFIX: &str = "draft-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Client-side identifier for a record the server has not confirmed yet.
    /// Never collides with server ids or with other drafts.
    pub fn draft() -> Self {
        Self(format!("{DRAFT_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Fresh id for a record that only ever lives in the local cache.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn is_draft(&self) -> bool {
        self.0.starts_with(DRAFT_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Remote resources hand out numeric ids; they are keyed as their decimal text.
impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(number) => Self(number.to_string()),
            RawId::Unsigned(number) => Self(number.to_string()),
        })
    }
}

/// A user record. Fields beyond `id` and `name` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Unconfirmed record carrying a fresh draft id.
    pub fn draft(name: impl Into<String>) -> Self {
        Self::new(UserId::draft(), name)
    }
}

/// Partial update: `None` and absent keys leave the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserChanges {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: Map::new(),
        }
    }
}

impl From<User> for UserChanges {
    fn from(user: User) -> Self {
        Self {
            name: Some(user.name),
            extra: user.extra,
        }
    }
}

thread_local! {
    static NAME_COLLATOR: RefCell<Collator> = RefCell::new(Collator::default());
}

/// Unicode collation order (CLDR root), exact text as tie-break.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NAME_COLLATOR
        .with(|collator| collator.borrow_mut().collate(a, b))
        .then_with(|| a.cmp(b))
}

impl Entity for User {
    type Id = UserId;
    type Changes = UserChanges;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        compare_names(&self.name, &other.name)
    }

    fn apply_changes(&mut self, changes: UserChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        for (key, value) in changes.extra {
            self.extra.insert(key, value);
        }
    }

    fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
