//! Box fetching from a remote zip URL or a local directory
//!
//! Remote boxes travel as zip archives; GitHub-style archives that wrap
//! everything in a single top-level directory are flattened on extraction.
//! Local boxes are copied directly, honoring an optional `.boxignore` file
//! with gitignore semantics at the box root.

use crate::error::UnboxError;
use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use url::Url;
use zip::ZipArchive;

/// Name of the optional ignore file at a local box root
pub const BOX_IGNORE_FILE: &str = ".boxignore";

/// User agent sent with remote box requests
const USER_AGENT: &str = concat!("unbox/", env!("CARGO_PKG_VERSION"));

/// Box source - either a remote zip URL or a local directory
#[derive(Debug, Clone)]
pub enum BoxSource {
    Remote(Url),
    Local(PathBuf),
}

impl BoxSource {
    /// Classify a raw source string: http(s) URLs are remote, everything
    /// else is a local path
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Local(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for BoxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxSource::Remote(url) => write!(f, "{}", url),
            BoxSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Box fetcher - retrieves a box's files into a staging directory
pub struct BoxFetcher {
    source: BoxSource,
    client: reqwest::Client,
}

impl BoxFetcher {
    pub fn new(source: BoxSource) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Fetch the box into `into`, which must already exist
    ///
    /// No retries: a missing source is [`UnboxError::SourceNotFound`], a
    /// transport failure is [`UnboxError::Connectivity`].
    pub async fn fetch(&self, into: &Path) -> Result<()> {
        match &self.source {
            BoxSource::Remote(url) => self.fetch_remote(url, into).await,
            BoxSource::Local(path) => fetch_local(path, into),
        }
    }

    async fn fetch_remote(&self, url: &Url, into: &Path) -> Result<()> {
        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| UnboxError::Connectivity {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(UnboxError::SourceNotFound {
                name: url.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(UnboxError::Connectivity {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| UnboxError::Connectivity {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        extract_zip(&bytes, into)
            .with_context(|| format!("Failed to extract box archive from {}", url))
    }
}

/// Extract a zip archive into `into`
///
/// When every entry lives under one shared top-level directory (the shape
/// GitHub produces for repository archives), that prefix is stripped so the
/// box contents land directly in `into`.
pub fn extract_zip(bytes: &[u8], into: &Path) -> Result<()> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("Box archive is not a valid zip file")?;

    let prefix = shared_prefix(archive.file_names());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        // Guard against zip-slip: entries with hostile paths are rejected
        let Some(entry_path) = file.enclosed_name() else {
            return Err(UnboxError::mismatch(file.name(), "unsafe path in box archive").into());
        };

        let relative = match &prefix {
            Some(prefix) => match entry_path.strip_prefix(prefix) {
                Ok(stripped) => stripped.to_path_buf(),
                Err(_) => entry_path,
            },
            None => entry_path,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = into.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target, &contents)
            .with_context(|| format!("Failed to write file: {}", target.display()))?;
    }

    Ok(())
}

/// The single top-level directory shared by every archive entry, if any
fn shared_prefix<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut prefix: Option<&str> = None;
    for name in names {
        let (first, _) = name.split_once('/')?;
        match prefix {
            None => prefix = Some(first),
            Some(existing) if existing == first => {}
            Some(_) => return None,
        }
    }
    prefix.map(str::to_string)
}

/// Copy a local box directory into `into`, honoring `.boxignore`
fn fetch_local(source: &Path, into: &Path) -> Result<()> {
    if !source.exists() {
        return Err(UnboxError::SourceNotFound {
            name: source.display().to_string(),
        }
        .into());
    }
    if !source.is_dir() {
        return Err(UnboxError::SourceNotFound {
            name: format!("{} (not a directory)", source.display()),
        }
        .into());
    }

    let rules = load_ignore_rules(source)?;
    copy_box_dir(source, source, into, rules.as_ref())
}

/// Parse `.boxignore` at the box root, if present
///
/// An absent file means no rules; a present but unreadable file is an
/// error rather than being silently skipped.
fn load_ignore_rules(root: &Path) -> Result<Option<Gitignore>> {
    let ignore_file = root.join(BOX_IGNORE_FILE);
    if !ignore_file.is_file() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(e) = builder.add(&ignore_file) {
        return Err(e).with_context(|| format!("Failed to read {}", ignore_file.display()));
    }
    let rules = builder
        .build()
        .with_context(|| format!("Failed to parse {}", ignore_file.display()))?;
    Ok(Some(rules))
}

fn copy_box_dir(root: &Path, dir: &Path, target: &Path, rules: Option<&Gitignore>) -> Result<()> {
    std::fs::create_dir_all(target)
        .with_context(|| format!("Failed to create directory: {}", target.display()))?;

    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let name = entry.file_name();
        let is_dir = path.is_dir();

        // Never ship VCS metadata or the ignore file itself
        if is_dir && name == ".git" {
            continue;
        }
        if dir == root && name == BOX_IGNORE_FILE {
            continue;
        }
        if let Some(rules) = rules {
            if rules.matched(&path, is_dir).is_ignore() {
                continue;
            }
        }

        let dest = target.join(&name);
        if is_dir {
            copy_box_dir(root, &path, &dest, rules)?;
        } else {
            std::fs::copy(&path, &dest).with_context(|| {
                format!("Failed to copy {} to {}", path.display(), dest.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    fn run_fetch(source: BoxSource, into: &Path) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(BoxFetcher::new(source).fetch(into))
    }

    #[test]
    fn test_parse_source_classification() {
        assert!(matches!(
            BoxSource::parse("https://example.com/box.zip"),
            BoxSource::Remote(_)
        ));
        assert!(matches!(
            BoxSource::parse("./local/box"),
            BoxSource::Local(_)
        ));
        // A bare name is a local path, not a URL
        assert!(matches!(BoxSource::parse("starter"), BoxSource::Local(_)));
    }

    #[test]
    fn test_extract_zip_strips_shared_prefix() {
        let bytes = build_zip(&[
            ("repo-main/README.md", "readme"),
            ("repo-main/src/main.rs", "fn main() {}"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        extract_zip(&bytes, dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "readme"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
        assert!(!dir.path().join("repo-main").exists());
    }

    #[test]
    fn test_extract_zip_flat_archive_kept_as_is() {
        let bytes = build_zip(&[("a.txt", "a"), ("sub/b.txt", "b")]);
        let dir = tempfile::tempdir().unwrap();
        extract_zip(&bytes, dir.path()).unwrap();

        assert!(dir.path().join("a.txt").is_file());
        assert!(dir.path().join("sub/b.txt").is_file());
    }

    #[test]
    fn test_extract_zip_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_zip(b"not a zip", dir.path()).is_err());
    }

    #[test]
    fn test_local_fetch_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_fetch(
            BoxSource::Local(dir.path().join("does-not-exist")),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UnboxError>(),
            Some(UnboxError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_local_fetch_copies_tree() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), "aaa").unwrap();
        std::fs::create_dir(source.path().join("sub")).unwrap();
        std::fs::write(source.path().join("sub/b.txt"), "bbb").unwrap();

        let staging = tempfile::tempdir().unwrap();
        run_fetch(BoxSource::Local(source.path().to_path_buf()), staging.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(staging.path().join("a.txt")).unwrap(),
            "aaa"
        );
        assert_eq!(
            std::fs::read_to_string(staging.path().join("sub/b.txt")).unwrap(),
            "bbb"
        );
    }

    #[test]
    fn test_local_fetch_honors_boxignore() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join(BOX_IGNORE_FILE), "*.log\nnode_modules/\n").unwrap();
        std::fs::write(source.path().join("keep.txt"), "keep").unwrap();
        std::fs::write(source.path().join("debug.log"), "noise").unwrap();
        std::fs::create_dir(source.path().join("node_modules")).unwrap();
        std::fs::write(source.path().join("node_modules/pkg.js"), "x").unwrap();

        let staging = tempfile::tempdir().unwrap();
        run_fetch(BoxSource::Local(source.path().to_path_buf()), staging.path()).unwrap();

        assert!(staging.path().join("keep.txt").is_file());
        assert!(!staging.path().join("debug.log").exists());
        assert!(!staging.path().join("node_modules").exists());
        assert!(
            !staging.path().join(BOX_IGNORE_FILE).exists(),
            "the ignore file itself is not shipped"
        );
    }

    #[test]
    fn test_local_fetch_skips_git_dir() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("file.txt"), "content").unwrap();
        std::fs::create_dir(source.path().join(".git")).unwrap();
        std::fs::write(source.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();

        let staging = tempfile::tempdir().unwrap();
        run_fetch(BoxSource::Local(source.path().to_path_buf()), staging.path()).unwrap();

        assert!(staging.path().join("file.txt").is_file());
        assert!(!staging.path().join(".git").exists());
    }
}
