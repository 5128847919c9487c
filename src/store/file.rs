//! Durable store: one pretty-printed JSON file per document at
//! `{root}/{collection}/{key}.json`. Rewriting a key replaces its file.

use crate::error::{PersistenceError, PersistenceResult};
use crate::store::{Query, StoreGateway};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> PersistenceResult<PathBuf> {
        validate_segment(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, key: &str) -> PersistenceResult<PathBuf> {
        validate_segment(key)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", key)))
    }
}

/// Keys become file names, so only a safe alphabet is accepted.
fn validate_segment(segment: &str) -> PersistenceResult<()> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(segment.to_string()))
    }
}

#[async_trait]
impl StoreGateway for FileStore {
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> PersistenceResult<()> {
        let path = self.document_path(collection, key)?;
        tokio::fs::create_dir_all(self.collection_dir(collection)?).await?;

        let json = serde_json::to_string_pretty(&document)?;
        // Write-then-rename so readers never observe a partial document
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(collection, key, "Saved document");
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> PersistenceResult<Option<Value>> {
        let path = self.document_path(collection, key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::Corrupt {
                collection: collection.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn query(&self, collection: &str, query: &Query) -> PersistenceResult<Vec<Value>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
            }
        }

        Ok(query.apply(documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.upsert("listings", "abc123", json!({"v": 1})).await.unwrap();
        store.upsert("listings", "abc123", json!({"v": 2})).await.unwrap();

        assert_eq!(store.get("listings", "abc123").await.unwrap(), Some(json!({"v": 2})));
        let files: Vec<_> = std::fs::read_dir(dir.path().join("listings")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn missing_documents_and_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("intents", "nope").await.unwrap().is_none());
        assert!(store.query("intents", &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.upsert("listings", "../escape", json!({})).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn query_filters_documents_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.upsert("intents", "a", json!({"score": 0.95})).await.unwrap();
        store.upsert("intents", "b", json!({"score": 0.4})).await.unwrap();
        std::fs::write(dir.path().join("intents").join("junk.json"), "{not json").unwrap();

        let result = store
            .query("intents", &Query::new().gte("score", 0.9))
            .await
            .unwrap();
        assert_eq!(result, vec![json!({"score": 0.95})]);
    }
}
