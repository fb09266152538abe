//! Credential persistence.
//!
//! [`UserStore`] is the capability the credential layer needs: insert a user
//! once, and look up the stored hash by username. The shipped backend is an
//! embedded document database; an in-memory backend serves tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use polodb_core::bson::doc;
use polodb_core::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Name of the collection holding user records.
pub const USERS_COLLECTION: &str = "users";

/// One row of the users collection. `password` always holds a hash.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password: String,
}

/// Backing storage for credentials.
///
/// Implementations must reject a second insert for the same username with
/// [`StoreError::DuplicateUser`] and leave the existing record untouched.
pub trait UserStore: Send + Sync {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError>;

    fn lookup_hash(&self, username: &str) -> Result<Option<String>, StoreError>;
}

/// [`UserStore`] on top of a PoloDB file.
pub struct PoloUserStore {
    // Held across the uniqueness check and the insert.
    db: Mutex<Database>,
}

impl PoloUserStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::open_file(path)?;
        Ok(Self::with_database(db))
    }

    /// A store that lives only as long as the process.
    pub fn open_memory() -> Result<Self, StoreError> {
        let db = Database::open_memory()?;
        Ok(Self::with_database(db))
    }

    fn with_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn with_users<T>(&self, f: impl FnOnce(&Collection<UserRecord>) -> T) -> T {
        let db = self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Collections are created lazily on first insert, so opening an
        // existing file needs no setup.
        f(&db.collection::<UserRecord>(USERS_COLLECTION))
    }
}

impl UserStore for PoloUserStore {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        self.with_users(|users| {
            if users.find_one(doc! { "username": username })?.is_some() {
                return Err(StoreError::DuplicateUser(username.to_string()));
            }
            // Users are never deleted, so the count is the highest id handed out.
            let id = users.count_documents()? + 1;
            users.insert_one(UserRecord {
                id,
                username: username.to_string(),
                password: password_hash.to_string(),
            })?;
            Ok(())
        })
    }

    fn lookup_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        let record = self.with_users(|users| users.find_one(doc! { "username": username }))?;
        Ok(record.map(|record| record.password))
    }
}

/// In-memory [`UserStore`], mostly for tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap_or_else(|p| p.into_inner());
        if users.contains_key(username) {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }
        let id = users.len() as u64 + 1;
        users.insert(
            username.to_string(),
            UserRecord {
                id,
                username: username.to_string(),
                password: password_hash.to_string(),
            },
        );
        Ok(())
    }

    fn lookup_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        let users = self.users.lock().unwrap_or_else(|p| p.into_inner());
        Ok(users.get(username).map(|record| record.password.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_store(store: &dyn UserStore) {
        assert_eq!(store.lookup_hash("alice").unwrap(), None);

        store.insert_user("alice", "hash-1").unwrap();
        assert_eq!(store.lookup_hash("alice").unwrap().as_deref(), Some("hash-1"));

        let err = store.insert_user("alice", "hash-2").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUser(ref name) if name == "alice"));
        assert_eq!(store.lookup_hash("alice").unwrap().as_deref(), Some("hash-1"));

        store.insert_user("bob", "hash-3").unwrap();
        assert_eq!(store.lookup_hash("bob").unwrap().as_deref(), Some("hash-3"));
    }

    #[test]
    fn memory_store_contract() {
        exercise_store(&MemoryUserStore::new());
    }

    #[test]
    fn polo_store_contract() {
        exercise_store(&PoloUserStore::open_memory().unwrap());
    }

    #[test]
    fn polo_store_assigns_increasing_ids() {
        let store = PoloUserStore::open_memory().unwrap();
        store.insert_user("alice", "h1").unwrap();
        store.insert_user("bob", "h2").unwrap();
        assert!(matches!(
            store.insert_user("alice", "h3"),
            Err(StoreError::DuplicateUser(ref name)) if name == "alice"
        ));

        store.with_users(|users| {
            let alice = users.find_one(doc! { "username": "alice" }).unwrap().unwrap();
            let bob = users.find_one(doc! { "username": "bob" }).unwrap().unwrap();
            assert_eq!((alice.id, bob.id), (1, 2));
            assert_eq!(users.count_documents().unwrap(), 2);
        });
    }

    #[test]
    fn polo_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        {
            let store = PoloUserStore::open(&path).unwrap();
            store.insert_user("alice", "hash").unwrap();
        }
        let store = PoloUserStore::open(&path).unwrap();
        assert_eq!(store.lookup_hash("alice").unwrap().as_deref(), Some("hash"));
        assert!(matches!(
            store.insert_user("alice", "other"),
            Err(StoreError::DuplicateUser(_))
        ));
    }
}
