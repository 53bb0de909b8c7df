use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, Stream};
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use super::mirror::ArtifactMirror;
use super::naming::{content_type_for, validate_name, KNOWN_EXTENSIONS};
use crate::error::StoreError;
use crate::provider::AudioPayload;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub source_task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_key: Option<String>,
}

pub struct ArtifactStream {
    pub name: String,
    pub content_type: &'static str,
    pub len: u64,
    pub body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

/// Audio files in a flat local directory, optionally copied to a mirror.
///
/// Every writer targets a name derived from its own task id, so concurrent
/// tasks never share a destination. Writes go to a temp file first and are
/// renamed into place.
#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    mirror: Option<Arc<dyn ArtifactMirror>>,
}

impl ArtifactStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(root.display().to_string(), e))?;
        Ok(Self { root, mirror: None })
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn ArtifactMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    pub async fn save(
        &self,
        name: &str,
        source_task_id: &str,
        payload: &AudioPayload,
    ) -> Result<StoredArtifact, StoreError> {
        let path = self.path_of(name)?;
        let tmp = self
            .root
            .join(format!(".{}.{}.part", name, Uuid::new_v4().simple()));

        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&payload.bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &path).await
        };
        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(name, e));
        }

        tracing::info!(
            target: "songbridge.store",
            name = %name,
            task_id = %source_task_id,
            size = payload.bytes.len(),
            "Artifact saved"
        );

        let mirror_key = match &self.mirror {
            Some(mirror) => match mirror.put(name, payload).await {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!(
                        target: "songbridge.store",
                        name = %name,
                        mirror = %mirror.name(),
                        error = %e,
                        "Mirror upload failed; local copy kept"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(StoredArtifact {
            name: name.to_string(),
            content_type: payload.content_type.clone(),
            size: payload.bytes.len() as u64,
            source_task_id: source_task_id.to_string(),
            mirror_key,
        })
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path_of(name) {
            Ok(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Find a stored artifact by name without extension.
    pub async fn locate(&self, stem: &str) -> Option<String> {
        for ext in KNOWN_EXTENSIONS {
            let name = format!("{stem}.{ext}");
            if self.exists(&name).await {
                return Some(name);
            }
        }
        None
    }

    pub async fn open_stream(&self, name: &str) -> Result<ArtifactStream, StoreError> {
        let path = self.path_of(name)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(StoreError::io(name, e)),
        };
        let len = file
            .metadata()
            .await
            .map_err(|e| StoreError::io(name, e))?
            .len();

        Ok(ArtifactStream {
            name: name.to_string(),
            content_type: content_type_for(name),
            len,
            body: Box::pin(file_chunks(file)),
        })
    }
}

fn file_chunks(mut file: tokio::fs::File) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    async_stream::try_stream! {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyMirror {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArtifactMirror for FlakyMirror {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn put(&self, name: &str, _payload: &AudioPayload) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Mirror {
                    key: name.to_string(),
                    message: "bucket unavailable".into(),
                })
            } else {
                Ok(format!("songs/{name}"))
            }
        }
    }

    async fn read_all(stream: ArtifactStream) -> Vec<u8> {
        let mut out = Vec::new();
        let mut body = stream.body;
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn save_then_stream_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).await.unwrap();
        // Larger than one read chunk so the stream yields several pieces.
        let bytes: Vec<u8> = (0..(READ_CHUNK * 2 + 17)).map(|i| (i % 251) as u8).collect();
        let payload = AudioPayload::new(bytes.clone(), "audio/mpeg");

        let stored = store.save("song-t1-0.mp3", "t1", &payload).await.unwrap();
        assert_eq!(stored.size, bytes.len() as u64);
        assert!(stored.mirror_key.is_none());
        assert!(store.exists("song-t1-0.mp3").await);

        let stream = store.open_stream("song-t1-0.mp3").await.unwrap();
        assert_eq!(stream.len, bytes.len() as u64);
        assert_eq!(stream.content_type, "audio/mpeg");
        assert_eq!(read_all(stream).await, bytes);
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).await.unwrap();
        assert!(!store.exists("nope.mp3").await);
        assert!(matches!(
            store.open_stream("nope.mp3").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_names_never_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).await.unwrap();
        let payload = AudioPayload::new(vec![1u8, 2, 3], "audio/mpeg");
        assert!(matches!(
            store.save("../escape.mp3", "t", &payload).await,
            Err(StoreError::InvalidName(_))
        ));
        assert!(!store.exists("../escape.mp3").await);
    }

    #[tokio::test]
    async fn locate_probes_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).await.unwrap();
        store
            .save("inline-42.wav", "inline-42", &AudioPayload::new(vec![0u8; 4], "audio/wav"))
            .await
            .unwrap();
        assert_eq!(store.locate("inline-42").await.as_deref(), Some("inline-42.wav"));
        assert_eq!(store.locate("inline-43").await, None);
    }

    #[tokio::test]
    async fn mirror_failure_does_not_fail_save() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = Arc::new(FlakyMirror {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let store = ArtifactStore::open(dir.path())
            .await
            .unwrap()
            .with_mirror(mirror.clone());

        let stored = store
            .save("song-t2-0.mp3", "t2", &AudioPayload::new(vec![9u8; 8], "audio/mpeg"))
            .await
            .unwrap();
        assert!(stored.mirror_key.is_none());
        assert_eq!(mirror.calls.load(Ordering::SeqCst), 1);
        assert!(store.exists("song-t2-0.mp3").await);
    }

    #[tokio::test]
    async fn mirror_success_records_key() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = Arc::new(FlakyMirror {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let store = ArtifactStore::open(dir.path())
            .await
            .unwrap()
            .with_mirror(mirror);
        let stored = store
            .save("song-t3-0.mp3", "t3", &AudioPayload::new(vec![1u8], "audio/mpeg"))
            .await
            .unwrap();
        assert_eq!(stored.mirror_key.as_deref(), Some("songs/song-t3-0.mp3"));
    }
}
