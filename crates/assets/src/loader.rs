//! Background mesh loading.
//!
//! Files are read and parsed on worker threads; results come back over a
//! channel and are registered on the main thread when the frame loop polls.

use crate::{AssetError, MeshData, MeshId, assimp};
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Load state of one requested asset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetSlot {
    #[default]
    Pending,
    Ready(MeshId),
    Failed(String),
}

impl AssetSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetSlot::Ready(_))
    }

    pub fn mesh_id(&self) -> Option<MeshId> {
        match self {
            AssetSlot::Ready(id) => Some(*id),
            _ => None,
        }
    }
}

/// A finished load, tagged with the caller's key.
#[derive(Debug)]
pub struct LoadResult<K> {
    pub key: K,
    pub path: PathBuf,
    pub result: Result<MeshData, AssetError>,
}

/// Spawns one worker per request and collects results.
pub struct AssetLoader<K> {
    sender: Sender<LoadResult<K>>,
    receiver: Receiver<LoadResult<K>>,
    in_flight: usize,
}

impl<K: Send + 'static> AssetLoader<K> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Number of requests whose results have not been polled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start loading an Assimp JSON file in the background.
    pub fn request(&mut self, key: K, path: impl Into<PathBuf>) -> Result<(), AssetError> {
        let path = path.into();
        let sender = self.sender.clone();
        let worker_path = path.clone();
        thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = assimp::load_file(&worker_path);
                // The receiver lives as long as the loader; a send error only
                // means the loader was dropped mid-load.
                let _ = sender.send(LoadResult {
                    key,
                    path: worker_path,
                    result,
                });
            })?;
        tracing::debug!("requested {}", path.display());
        self.in_flight += 1;
        Ok(())
    }

    /// Collect every finished load without blocking.
    pub fn poll(&mut self) -> Vec<LoadResult<K>> {
        let mut done = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(result) => done.push(result),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.in_flight -= done.len().min(self.in_flight);
        done
    }

    /// Block until the next load finishes or the timeout elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadResult<K>> {
        if self.in_flight == 0 {
            return None;
        }
        let result = self.receiver.recv_timeout(timeout).ok()?;
        self.in_flight -= 1;
        Some(result)
    }
}

impl<K: Send + 'static> Default for AssetLoader<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRI: &str = r#"{ "meshes": [ { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0,1,2]] } ] }"#;

    #[test]
    fn slot_defaults_to_pending() {
        let slot = AssetSlot::default();
        assert_eq!(slot, AssetSlot::Pending);
        assert!(!slot.is_ready());
        assert_eq!(slot.mesh_id(), None);
        assert_eq!(AssetSlot::Ready(MeshId(3)).mesh_id(), Some(MeshId(3)));
    }

    #[test]
    fn loads_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shape.json");
        std::fs::write(&path, TRI).unwrap();

        let mut loader = AssetLoader::new();
        loader.request("shape", &path).unwrap();
        assert_eq!(loader.in_flight(), 1);

        let done = loader.wait(Duration::from_secs(10)).expect("load finished");
        assert_eq!(done.key, "shape");
        assert_eq!(done.result.unwrap().triangle_count(), 1);
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn missing_file_reports_error() {
        let mut loader = AssetLoader::new();
        loader.request(1u8, "/nonexistent/temple.json").unwrap();
        let done = loader.wait(Duration::from_secs(10)).expect("load finished");
        assert_eq!(done.key, 1);
        assert!(matches!(done.result, Err(AssetError::Io(_))));
    }

    #[test]
    fn poll_is_non_blocking_when_idle() {
        let mut loader: AssetLoader<()> = AssetLoader::new();
        assert!(loader.poll().is_empty());
        assert!(loader.wait(Duration::from_millis(1)).is_none());
    }
}
