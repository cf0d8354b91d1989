//! Durable named lists (shopping lists, watch-lists, …), owned per
//! (channel, chat_id) just like a `CronJob`. Same atomic-JSON-document
//! shape as the cron store, simplified: no scheduling, just ordered items.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Owner;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// Sequential within the list, starting at 1; stable once assigned.
    pub id: u32,
    pub text: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedList {
    pub owner: Owner,
    pub name: String,
    pub items: Vec<ListItem>,
    pub next_item_id: u32,
}

impl NamedList {
    fn new(owner: Owner, name: String) -> Self {
        Self {
            owner,
            name,
            items: Vec::new(),
            next_item_id: 1,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    lists: Vec<NamedList>,
}

/// Per-owner named lists, persisted as a single JSON document written
/// atomically (temp file + rename) on every mutation — the same durability
/// shape the cron store uses.
pub struct ListStore {
    path: PathBuf,
    doc: Mutex<Document>,
}

impl ListStore {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Document {
                version: 1,
                lists: Vec::new(),
            },
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    fn save(&self, doc: &Document) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Appends `text` to `name` (created on first use), returning the new
    /// item.
    pub fn add_item(&self, owner: &Owner, name: &str, text: &str) -> io::Result<ListItem> {
        let mut doc = self.doc.lock().unwrap();
        let list = self.find_or_create(&mut doc, owner, name);
        let item = ListItem {
            id: list.next_item_id,
            text: text.to_string(),
            created_at_ms: Utc::now().timestamp_millis(),
        };
        list.next_item_id += 1;
        list.items.push(item.clone());
        self.save(&doc)?;
        Ok(item)
    }

    /// Removes item `item_id` from `name`. Returns `false` if neither the
    /// list nor the item exists.
    pub fn remove_item(&self, owner: &Owner, name: &str, item_id: u32) -> io::Result<bool> {
        let mut doc = self.doc.lock().unwrap();
        let Some(list) = doc
            .lists
            .iter_mut()
            .find(|l| &l.owner == owner && l.name.eq_ignore_ascii_case(name))
        else {
            return Ok(false);
        };
        let before = list.items.len();
        list.items.retain(|i| i.id != item_id);
        let changed = list.items.len() != before;
        if changed {
            self.save(&doc)?;
        }
        Ok(changed)
    }

    /// Items in `name`, oldest first. Empty when the list doesn't exist.
    pub fn items(&self, owner: &Owner, name: &str) -> Vec<ListItem> {
        let doc = self.doc.lock().unwrap();
        doc.lists
            .iter()
            .find(|l| &l.owner == owner && l.name.eq_ignore_ascii_case(name))
            .map(|l| l.items.clone())
            .unwrap_or_default()
    }

    /// Every list name this owner has created, sorted.
    pub fn list_names(&self, owner: &Owner) -> Vec<String> {
        let doc = self.doc.lock().unwrap();
        let mut names: Vec<String> = doc
            .lists
            .iter()
            .filter(|l| &l.owner == owner)
            .map(|l| l.name.clone())
            .collect();
        names.sort();
        names
    }

    fn find_or_create<'a>(&self, doc: &'a mut Document, owner: &Owner, name: &str) -> &'a mut NamedList {
        if let Some(idx) = doc
            .lists
            .iter()
            .position(|l| &l.owner == owner && l.name.eq_ignore_ascii_case(name))
        {
            return &mut doc.lists[idx];
        }
        doc.lists.push(NamedList::new(owner.clone(), name.to_string()));
        doc.lists.last_mut().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zapista-lists-test-{tag}-{}.json", std::process::id()))
    }

    #[test]
    fn add_and_list_items_roundtrip() {
        let path = tmp_path("roundtrip");
        let _ = fs::remove_file(&path);
        let store = ListStore::load(&path).unwrap();
        let owner = Owner::new("whatsapp", "U1");

        store.add_item(&owner, "mercado", "leite").unwrap();
        store.add_item(&owner, "mercado", "pao").unwrap();

        let items = store.items(&owner, "mercado");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "leite");
        assert_eq!(items[1].id, 2);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn lists_are_scoped_per_owner() {
        let path = tmp_path("scoped");
        let _ = fs::remove_file(&path);
        let store = ListStore::load(&path).unwrap();
        let a = Owner::new("whatsapp", "A");
        let b = Owner::new("whatsapp", "B");

        store.add_item(&a, "mercado", "leite").unwrap();
        assert!(store.items(&b, "mercado").is_empty());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn remove_item_reports_whether_anything_changed() {
        let path = tmp_path("remove");
        let _ = fs::remove_file(&path);
        let store = ListStore::load(&path).unwrap();
        let owner = Owner::new("whatsapp", "U1");
        let item = store.add_item(&owner, "mercado", "leite").unwrap();

        assert!(store.remove_item(&owner, "mercado", item.id).unwrap());
        assert!(!store.remove_item(&owner, "mercado", item.id).unwrap());
        assert!(store.items(&owner, "mercado").is_empty());

        fs::remove_file(&path).ok();
    }
}
