use async_trait::async_trait;
use seatline_core::{ReservationStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One JSON file per key under a directory; survives client restarts the way
/// browser origin storage survives page reloads.
#[derive(Debug, Clone)]
pub struct FileReservationStore {
    dir: PathBuf,
}

impl FileReservationStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Keeps `[A-Za-z0-9_-]`, percent-encodes every other byte so user ids can't escape the directory.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[async_trait]
impl ReservationStore for FileReservationStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError(format!("cannot read {}: {}", path.display(), e))),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| StoreError(format!("cannot write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError(format!("cannot replace {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Reservation saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Reservation removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError(format!("cannot remove {}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReservationStore::open(dir.path()).await.unwrap();

        assert!(store.load("reservation_U1").await.unwrap().is_none());

        store.save("reservation_U1", r#"{"seatNumber":14}"#).await.unwrap();
        store.save("reservation_U1", r#"{"seatNumber":15}"#).await.unwrap();
        assert_eq!(
            store.load("reservation_U1").await.unwrap().as_deref(),
            Some(r#"{"seatNumber":15}"#)
        );

        store.remove("reservation_U1").await.unwrap();
        assert!(store.load("reservation_U1").await.unwrap().is_none());
        assert!(!dir.path().join("reservation_U1.json").exists());
        store.remove("reservation_U1").await.unwrap();
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileReservationStore::open(dir.path()).await.unwrap();
            store.save("reservation_U1", "{}").await.unwrap();
        }
        let reopened = FileReservationStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.load("reservation_U1").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_hostile_key_stays_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReservationStore::open(dir.path().join("nested")).await.unwrap();

        store.save("reservation_../../etc", "{}").await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(store.path_for("reservation_../../etc").starts_with(store.dir()));
    }

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("reservation_U-1"), "reservation_U-1");
        assert_eq!(encode_key("reservation_a/b c"), "reservation_a%2Fb%20c");
    }
}
