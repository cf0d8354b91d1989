//! Atomic JSON persistence for the two admin documents, same shape as the
//! cron store: read on load, write-temp-then-rename on every mutation.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub fn load<T: Default + DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    match fs::read_to_string(path.as_ref()) {
        Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save<T: Serialize>(path: impl AsRef<Path>, doc: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(doc).map_err(crate::error::AdminError::from)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl From<serde_json::Error> for crate::error::AdminError {
    fn from(e: serde_json::Error) -> Self {
        crate::error::AdminError::Corrupt(e.to_string())
    }
}
