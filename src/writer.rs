//! Batched, append-only output writer (C3).
//!
//! One `BatchWriter` per output path. `append` serializes each element to a
//! JSON line and writes the whole batch under the writer's lock, flushing
//! once per call. I/O errors are logged and swallowed — the engine prefers
//! forward progress over failing the run because an output file could not be
//! written to.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

pub struct BatchWriter {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl BatchWriter {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Append a batch of JSON-serializable records, one per line.
    ///
    /// A no-op for an empty batch. Swallows and logs I/O errors rather than
    /// propagating them.
    pub async fn append<T: Serialize>(&self, batch: &[T]) {
        if batch.is_empty() {
            return;
        }

        let mut file = self.file.lock().await;
        for item in batch {
            if let Err(err) = write_line(&mut file, item).await {
                tracing::error!(path = %self.path.display(), error = %err, "failed to write output line");
                return;
            }
        }

        if let Err(err) = file.flush().await {
            tracing::error!(path = %self.path.display(), error = %err, "failed to flush output file");
        }
    }
}

async fn write_line<T: Serialize>(
    file: &mut BufWriter<File>,
    item: &T,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(item).map_err(std::io::Error::other)?;
    line.push(b'\n');
    file.write_all(&line).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    async fn read_file(path: &Path) -> String {
        let mut contents = String::new();
        File::open(path)
            .await
            .unwrap()
            .read_to_string(&mut contents)
            .await
            .unwrap();
        contents
    }

    #[tokio::test]
    async fn appends_one_json_line_per_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let writer = BatchWriter::open(&path).await.unwrap();
        writer.append(&[json!({"a": 1}), json!({"b": 2})]).await;

        let contents = read_file(&path).await;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(serde_json::from_str::<serde_json::Value>(lines[0]).unwrap(), json!({"a": 1}));
        assert_eq!(serde_json::from_str::<serde_json::Value>(lines[1]).unwrap(), json!({"b": 2}));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let writer = BatchWriter::open(&path).await.unwrap();
        writer.append::<serde_json::Value>(&[]).await;

        assert_eq!(read_file(&path).await, "");
    }

    #[tokio::test]
    async fn preserves_prior_content_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        {
            let writer = BatchWriter::open(&path).await.unwrap();
            writer.append(&[json!({"a": 1})]).await;
        }
        {
            let writer = BatchWriter::open(&path).await.unwrap();
            writer.append(&[json!({"b": 2})]).await;
        }

        let contents = read_file(&path).await;
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn does_not_escape_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let writer = BatchWriter::open(&path).await.unwrap();
        writer.append(&[json!({"name": "caf\u{e9}"})]).await;

        let contents = read_file(&path).await;
        assert!(contents.contains('\u{e9}'));
    }
}
