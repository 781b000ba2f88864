use aci_docindex::{read_shard, SearchEntry};
use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardReport {
    pub path: PathBuf,
    pub entries: usize,
    pub targets: usize,
    pub duplicates: Vec<String>,
    /// Entry matching the looked up token, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<SearchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckIndexReport {
    pub shards: Vec<ShardReport>,
    pub duplicate_keys: usize,
}

impl CheckIndexReport {
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_keys > 0
    }
}

/// Shard files named by the arguments, directories searched for `.js` files
fn shard_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log::warn!("skipping unreadable entry: {err}");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|file| file.extension().is_some_and(|extension| extension == "js"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn check_shard(path: &Path, lookup: Option<&str>) -> Result<ShardReport> {
    let shard = read_shard(path).with_context(|| format!("Invalid search shard {}", path.display()))?;
    let duplicates: Vec<String> = shard.duplicate_keys().into_iter().map(String::from).collect();
    for key in &duplicates {
        log::warn!("{}: duplicate key '{key}'", path.display());
    }

    Ok(ShardReport {
        path: path.to_path_buf(),
        entries: shard.len(),
        targets: shard.entries.iter().map(|entry| entry.targets.len()).sum(),
        lookup: lookup.and_then(|token| shard.lookup(token).cloned()),
        duplicates,
    })
}

/// Parse search shards and report their duplicate keys
pub fn run_check_index(paths: &[PathBuf], lookup: Option<&str>) -> Result<CheckIndexReport> {
    let shards = shard_files(paths)
        .iter()
        .map(|path| check_shard(path, lookup))
        .collect::<Result<Vec<_>>>()?;
    if shards.is_empty() {
        log::warn!("no search shards found");
    }

    Ok(CheckIndexReport {
        duplicate_keys: shards.iter().map(|shard| shard.duplicates.len()).sum(),
        shards,
    })
}
