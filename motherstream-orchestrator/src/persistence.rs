//! Atomic snapshot persistence for the queue.
//!
//! Writes go to a `.tmp` sibling file, which is then renamed over the
//! target path. Rename is atomic on the same filesystem, so a crash
//! mid-write never leaves a torn `QUEUE.json` behind.

use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `ids` as a JSON array to `path`, replacing any existing file
/// atomically.
pub async fn write_queue_snapshot(path: &Path, ids: &[i64]) -> std::io::Result<()> {
    let tmp_path = tmp_sibling(path);
    let body = serde_json::to_vec(ids).expect("Vec<i64> always serializes");

    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(&body).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Read the persisted id list, if the file exists. Missing file is not an
/// error: it means first startup.
pub async fn read_queue_snapshot(path: &Path) -> std::io::Result<Vec<i64>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_atomic_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("QUEUE.json");

        write_queue_snapshot(&path, &[1, 2, 3]).await.unwrap();
        let loaded = read_queue_snapshot(&path).await.unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);

        // no .tmp file left behind
        assert!(!tmp_sibling(&path).exists());
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        assert_eq!(read_queue_snapshot(&path).await.unwrap(), Vec::<i64>::new());
    }
}
