//! Resume-state loader (C4).
//!
//! Reconstructs the processed-ID set from a prior run's success file so a
//! re-run skips everything already done. A missing file is not an error — the
//! first run of a batch has nothing to resume from.

use crate::record::{extract_id, Record};
use std::collections::HashSet;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read `path` (if it exists) and return the set of IDs that should be
/// treated as already processed.
///
/// A line is skipped (with a warning) if it fails to parse as JSON, or if no
/// ID can be extracted. If `rerun_key` is set and present (truthy or not —
/// merely present) on a line, that line's ID is excluded from the set,
/// forcing it to be reprocessed.
pub async fn load_processed_ids(
    path: &Path,
    id_key: &str,
    rerun_key: Option<&str>,
) -> std::io::Result<HashSet<String>> {
    let mut ids = HashSet::new();

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(err) => return Err(err),
    };

    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: Record = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(path = %path.display(), line = line_no, error = %err, "skipping unparseable success line during resume");
                continue;
            }
        };

        let Some(id) = extract_id(&record, id_key) else {
            tracing::warn!(path = %path.display(), line = line_no, "skipping success line with no extractable id during resume");
            continue;
        };

        if let Some(rerun_key) = rerun_key {
            if record.contains_key(rerun_key) {
                continue;
            }
        }

        ids.insert(id);
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn write_file(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("success.jsonl");
        let mut file = tokio::fs::File::create(&path).await.unwrap();
        file.write_all(contents.as_bytes()).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.jsonl");
        let ids = load_processed_ids(&path, "id", None).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn collects_ids_from_well_formed_lines() {
        let (_dir, path) = write_file("{\"id\": \"a\"}\n{\"id\": \"b\"}\n").await;
        let ids = load_processed_ids(&path, "id", None).await.unwrap();
        assert_eq!(ids, ["a".to_string(), "b".to_string()].into_iter().collect());
    }

    #[tokio::test]
    async fn skips_unparseable_and_idless_lines() {
        let (_dir, path) = write_file("not json\n{\"v\": 1}\n{\"id\": \"a\"}\n").await;
        let ids = load_processed_ids(&path, "id", None).await.unwrap();
        assert_eq!(ids, ["a".to_string()].into_iter().collect());
    }

    #[tokio::test]
    async fn rerun_key_excludes_marked_records() {
        let (_dir, path) = write_file("{\"id\": \"a\", \"redo\": true}\n{\"id\": \"b\"}\n").await;
        let ids = load_processed_ids(&path, "id", Some("redo")).await.unwrap();
        assert_eq!(ids, ["b".to_string()].into_iter().collect());
    }
}
