// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use super::{CodespanLocationLink, CodespanResolver, SelectionRange};
use anyhow::Context as _;
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Files larger than this are skipped by symbol search.
const MAX_SYMBOL_FILE_BYTES: u64 = 512 * 1024;

const DEFINITION_KEYWORDS: &[&str] = &[
    "fn",
    "struct",
    "enum",
    "trait",
    "type",
    "mod",
    "class",
    "interface",
    "def",
    "function",
    "const",
];

/// Resolves code spans against the files of one workspace.
///
/// Path-like spans (`src/main.rs`, `main.rs:12`, `lib.rs:3-9`) match files by
/// path suffix; identifier-like spans (`parse_config`, `Parser()`) match the
/// first definition line found. The file list is scanned once, honouring
/// `.gitignore`, and reused for the resolver's lifetime.
pub struct WorkspaceResolver {
    root: PathBuf,
    max_files: usize,
    files: RefCell<Option<Arc<Vec<PathBuf>>>>,
}

impl WorkspaceResolver {
    pub fn new(root: impl Into<PathBuf>, max_files: usize) -> Self {
        Self { root: root.into(), max_files, files: RefCell::new(None) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn files(&self) -> anyhow::Result<Arc<Vec<PathBuf>>> {
        if let Some(files) = self.files.borrow().as_ref() {
            return Ok(Arc::clone(files));
        }
        let root = self.root.clone();
        let max_files = self.max_files;
        let scanned = tokio::task::spawn_blocking(move || scan_files(&root, max_files))
            .await
            .context("workspace scan task failed")?;
        tracing::debug!(root = %self.root.display(), files = scanned.len(), "scanned workspace");
        let files = Arc::new(scanned);
        *self.files.borrow_mut() = Some(Arc::clone(&files));
        Ok(files)
    }

    async fn resolve_path(
        &self,
        target: &str,
        selection: Option<SelectionRange>,
    ) -> anyhow::Result<CodespanLocationLink> {
        let direct = Path::new(target);
        let candidate = if direct.is_absolute() {
            direct.is_file().then(|| direct.to_path_buf())
        } else {
            let joined = self.root.join(direct);
            if joined.is_file() {
                Some(joined)
            } else {
                let files = self.files().await?;
                best_suffix_match(&files, direct).map(|rel| self.root.join(rel))
            }
        };
        Ok(candidate.map_or_else(CodespanLocationLink::default, |path| CodespanLocationLink {
            display_text: Some(path.to_string_lossy().into_owned()),
            uri: Some(path),
            selection,
        }))
    }

    async fn resolve_symbol(&self, name: &str) -> anyhow::Result<CodespanLocationLink> {
        let files = self.files().await?;
        let root = self.root.clone();
        let name = name.to_owned();
        let found = tokio::task::spawn_blocking(move || find_definition(&root, &files, &name))
            .await
            .context("symbol search task failed")?;
        Ok(found.map_or_else(CodespanLocationLink::default, |(path, line)| CodespanLocationLink {
            display_text: None,
            uri: Some(path),
            selection: Some(SelectionRange { start_line: line, end_line: line }),
        }))
    }
}

#[async_trait(?Send)]
impl CodespanResolver for WorkspaceResolver {
    async fn resolve(
        &self,
        codespan: &str,
        _thread_id: &str,
    ) -> anyhow::Result<CodespanLocationLink> {
        let trimmed = codespan.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Ok(CodespanLocationLink::default());
        }
        let (target, selection) = split_line_suffix(trimmed);
        if looks_like_path(target) {
            return self.resolve_path(target, selection).await;
        }
        let symbol = target.strip_suffix("()").unwrap_or(target);
        if is_identifier(symbol) {
            return self.resolve_symbol(symbol).await;
        }
        Ok(CodespanLocationLink::default())
    }
}

/// Workspace-relative file paths, shallowest first.
fn scan_files(root: &Path, max_files: usize) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|rel| !rel.starts_with(".git"))
        .take(max_files)
        .collect();
    files.sort_by_key(|rel| (rel.components().count(), rel.clone()));
    files
}

/// `main.rs:12` -> (`main.rs`, 12..12), `lib.rs:3-9` -> (`lib.rs`, 3..9).
fn split_line_suffix(text: &str) -> (&str, Option<SelectionRange>) {
    let Some((target, suffix)) = text.rsplit_once(':') else {
        return (text, None);
    };
    let (start, end) = suffix.split_once('-').unwrap_or((suffix, suffix));
    match (start.parse::<u32>(), end.parse::<u32>()) {
        (Ok(start_line), Ok(end_line)) if start_line > 0 && end_line >= start_line => {
            (target, Some(SelectionRange { start_line, end_line }))
        }
        _ => (text, None),
    }
}

fn looks_like_path(text: &str) -> bool {
    if text.contains('/') || text.contains('\\') {
        return true;
    }
    // `main.rs`, but not `self.method` or `1.5`.
    text.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && (1..=5).contains(&ext.len())
            && ext.chars().all(|c| c.is_ascii_lowercase())
            && !stem.chars().all(|c| c.is_ascii_digit())
            && !stem.contains('(')
    })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn best_suffix_match<'a>(files: &'a [PathBuf], target: &Path) -> Option<&'a PathBuf> {
    // `files` is sorted shallowest first, so the first hit is the best one.
    files.iter().find(|rel| rel.ends_with(target))
}

fn find_definition(root: &Path, files: &[PathBuf], name: &str) -> Option<(PathBuf, u32)> {
    for rel in files {
        let path = root.join(rel);
        let small_enough =
            std::fs::metadata(&path).is_ok_and(|meta| meta.len() <= MAX_SYMBOL_FILE_BYTES);
        if !small_enough {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            if defines(line, name) {
                let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
                return Some((path, line_no));
            }
        }
    }
    None
}

fn defines(line: &str, name: &str) -> bool {
    let mut words = line
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .peekable();
    while let Some(word) = words.next() {
        if DEFINITION_KEYWORDS.contains(&word) && words.peek() == Some(&name) {
            return true;
        }
    }
    false
}
