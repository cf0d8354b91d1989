use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zapista_core::types::Locale;

use crate::db;
use crate::error::Result;
use crate::types::User;

const CACHE_MAX: usize = 256;

#[derive(Debug)]
pub enum ResolvedUser {
    Known(User),
    NewlyCreated { user: User, needs_onboarding: bool },
}

impl ResolvedUser {
    pub fn user(&self) -> &User {
        match self {
            ResolvedUser::Known(u) => u,
            ResolvedUser::NewlyCreated { user, .. } => user,
        }
    }
}

/// SHA-256 hash of the raw phone digits — the only form ever stored or logged.
pub fn hash_phone(phone_digits: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone_digits.as_bytes());
    hex::encode(hasher.finalize())
}

fn phone_prefix(phone_digits: &str) -> &str {
    for prefix in ["351", "55", "54", "57", "56", "52", "51", "34"] {
        if phone_digits.starts_with(prefix) {
            return prefix;
        }
    }
    ""
}

/// Translates a raw WhatsApp phone number into a first-class user, caching
/// the phone-hash -> user_id mapping in memory to avoid a DB round-trip on
/// every inbound message. Same eviction strategy as the teacher: drop the
/// oldest half once the cache is full.
pub struct UserResolver {
    db: Arc<Mutex<Connection>>,
    cache: Mutex<HashMap<String, User>>,
    cache_order: Mutex<Vec<String>>,
}

impl UserResolver {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self {
            db,
            cache: Mutex::new(HashMap::new()),
            cache_order: Mutex::new(Vec::new()),
        }
    }

    /// Resolve a raw phone number to a user, auto-creating on first contact.
    pub fn resolve(&self, phone_digits: &str) -> Result<ResolvedUser> {
        let id = hash_phone(phone_digits);

        if let Some(user) = self.cache_lookup(&id) {
            debug!(user_id = %id, "user cache hit");
            return Ok(ResolvedUser::Known(user));
        }

        let conn = self.db.lock().unwrap();
        if let Some(user) = db::get_user(&conn, &id)? {
            drop(conn);
            self.cache_insert(user.clone());
            return Ok(ResolvedUser::Known(user));
        }

        info!(user_id = %id, "new identity; creating user");
        let language = Locale::from_phone_prefix(phone_prefix(phone_digits));
        let user = db::create_user(&conn, &id, phone_digits, language, "UTC")?;
        drop(conn);
        self.cache_insert(user.clone());

        Ok(ResolvedUser::NewlyCreated {
            user,
            needs_onboarding: true,
        })
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        if let Some(user) = self.cache_lookup(user_id) {
            return Ok(Some(user));
        }
        let conn = self.db.lock().unwrap();
        db::get_user(&conn, user_id)
    }

    pub fn invalidate_user(&self, user_id: &str) {
        let mut cache = self.cache.lock().unwrap();
        let mut order = self.cache_order.lock().unwrap();
        cache.remove(user_id);
        order.retain(|k| k != user_id);
    }

    fn cache_lookup(&self, id: &str) -> Option<User> {
        self.cache.lock().unwrap().get(id).cloned()
    }

    fn cache_insert(&self, user: User) {
        let mut cache = self.cache.lock().unwrap();
        let mut order = self.cache_order.lock().unwrap();

        if cache.contains_key(&user.id) {
            cache.insert(user.id.clone(), user);
            return;
        }

        if cache.len() >= CACHE_MAX {
            let evict_count = CACHE_MAX / 2;
            let to_remove: Vec<_> = order.drain(..evict_count).collect();
            for k in to_remove {
                cache.remove(&k);
            }
        }

        order.push(user.id.clone());
        cache.insert(user.id.clone(), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_phone_is_deterministic_and_never_reversible_looking() {
        let a = hash_phone("5511999998888");
        let b = hash_phone("5511999998888");
        assert_eq!(a, b);
        assert_ne!(a, "5511999998888");
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn phone_prefix_matches_longest_known_code() {
        assert_eq!(phone_prefix("5511999998888"), "55");
        assert_eq!(phone_prefix("351912345678"), "351");
    }
}
