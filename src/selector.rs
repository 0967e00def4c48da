//! Task selector (C5).
//!
//! Streams the input file and produces the filtered list of tasks the
//! dispatcher will run. Materializes the full `Vec<SelectedTask>` up front,
//! as the reference implementation is permitted to.

use crate::record::{extract_id, Record};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A record accepted for dispatch, with its ID already extracted.
#[derive(Debug, Clone)]
pub struct SelectedTask {
    pub id: String,
    pub record: Record,
}

/// Stream `path`, filtering out already-processed IDs and invalid lines.
///
/// Returns `Ok(tasks)` on success. A missing input file is the one terminal
/// error this stage raises; everything else (parse errors, missing IDs,
/// duplicate IDs) is warned and the line is either skipped or, for
/// duplicates, still emitted.
pub async fn select_tasks(
    path: &Path,
    id_key: &str,
    processed_ids: &HashSet<String>,
) -> std::io::Result<Vec<SelectedTask>> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut tasks = Vec::new();
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            tracing::warn!(path = %path.display(), line = line_no, "skipping blank line");
            continue;
        }

        let record: Record = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(path = %path.display(), line = line_no, error = %err, "skipping unparseable input line");
                continue;
            }
        };

        let Some(id) = extract_id(&record, id_key) else {
            tracing::warn!(path = %path.display(), line = line_no, "skipping input line with no extractable id");
            continue;
        };

        if processed_ids.contains(&id) {
            continue;
        }

        let occurrences = seen.entry(id.clone()).or_insert(0);
        *occurrences += 1;
        if *occurrences > 1 {
            tracing::warn!(id = %id, line = line_no, "duplicate id within input file; processing anyway");
        }

        tasks.push(SelectedTask { id, record });
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn write_file(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.jsonl");
        let mut file = tokio::fs::File::create(&path).await.unwrap();
        file.write_all(contents.as_bytes()).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        let result = select_tasks(&path, "id", &HashSet::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_file_yields_zero_tasks() {
        let (_dir, path) = write_file("").await;
        let tasks = select_tasks(&path, "id", &HashSet::new()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn filters_already_processed_ids() {
        let (_dir, path) = write_file("{\"id\": \"a\"}\n{\"id\": \"b\"}\n").await;
        let processed: HashSet<String> = ["a".to_string()].into_iter().collect();
        let tasks = select_tasks(&path, "id", &processed).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "b");
    }

    #[tokio::test]
    async fn skips_invalid_lines_but_keeps_the_rest() {
        let (_dir, path) = write_file("not json\n{\"v\": 1}\n{\"id\": \"a\"}\n").await;
        let tasks = select_tasks(&path, "id", &HashSet::new()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "a");
    }

    #[tokio::test]
    async fn duplicate_ids_are_both_emitted() {
        let (_dir, path) = write_file("{\"id\": \"a\"}\n{\"id\": \"a\"}\n").await;
        let tasks = select_tasks(&path, "id", &HashSet::new()).await.unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn final_line_without_trailing_newline_is_processed() {
        let (_dir, path) = write_file("{\"id\": \"a\"}").await;
        let tasks = select_tasks(&path, "id", &HashSet::new()).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
