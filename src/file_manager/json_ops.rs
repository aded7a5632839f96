// Atomic JSON file operations

use crate::error::StoreError;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

lazy_static::lazy_static! {
    static ref FILE_LOCK: Mutex<()> = Mutex::new(());
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_unlocked<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let mut file = File::open(path).map_err(|e| io_error(path, e))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| io_error(path, e))?;

    serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_unlocked<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let json_string = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("tmp");

    let mut temp_file = File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;

    temp_file
        .write_all(json_string.as_bytes())
        .map_err(|e| io_error(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| io_error(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| io_error(path, e))?;

    Ok(())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let _lock = FILE_LOCK.lock();
    read_unlocked(path)
}

/// Writes JSON atomically using write-to-temp-then-rename
pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let _lock = FILE_LOCK.lock();
    write_unlocked(path, data)
}

pub fn initialize_json_file<T: Serialize>(path: &Path, default: &T) -> Result<(), StoreError> {
    let _lock = FILE_LOCK.lock();
    if !path.exists() {
        log::debug!("Initializing JSON file: {:?}", path);
        write_unlocked(path, default)?;
    }
    Ok(())
}

pub fn read_json_file_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let _lock = FILE_LOCK.lock();
    if path.exists() {
        read_unlocked(path)
    } else {
        Ok(T::default())
    }
}

/// Read-modify-write under a single lock acquisition. A missing file starts from `T::default()`.
pub fn update_json_file<T, F>(path: &Path, update_fn: F) -> Result<T, StoreError>
where
    T: DeserializeOwned + Serialize + Default + Clone,
    F: FnOnce(&mut T),
{
    let _lock = FILE_LOCK.lock();
    let mut data: T = if path.exists() {
        read_unlocked(path)?
    } else {
        T::default()
    };
    update_fn(&mut data);
    write_unlocked(path, &data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_write_then_read_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), 1u32);

        write_json_file(&path, &data).unwrap();
        let read: BTreeMap<String, u32> = read_json_file(&path).unwrap();

        assert_eq!(read, data);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let read: Vec<String> = read_json_file_or_default(&dir.path().join("missing.json")).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_update_starts_from_default_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.json");

        update_json_file(&path, |v: &mut Vec<u32>| v.push(1)).unwrap();
        let updated = update_json_file(&path, |v: &mut Vec<u32>| v.push(2)).unwrap();

        assert_eq!(updated, vec![1, 2]);
        assert_eq!(read_json_file::<Vec<u32>>(&path).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_malformed_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json_file::<Vec<u32>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
