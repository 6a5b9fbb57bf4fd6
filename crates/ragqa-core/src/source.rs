//! Document sources: local adapters plus the concatenation used at build time.
//!
//! Remote adapters (cloud drives, hosted repositories) live outside this
//! crate; they only need to implement [`DocumentSource`]. Exported dumps of
//! such sources can be fed in through [`JsonlSource`].

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SourceSettings;
use crate::error::{Error, Result};
use crate::traits::DocumentSource;
use crate::types::{Document, DocumentRecord};

/// Concatenate the documents of every source, in order.
pub fn collect_documents(sources: &[Box<dyn DocumentSource>]) -> Result<Vec<Document>> {
    let mut all = Vec::new();
    for source in sources {
        let docs = source.list_documents()?;
        info!(source = source.source_tag(), documents = docs.len(), "loaded documents");
        all.extend(docs);
    }
    Ok(all)
}

/// Walks a local directory tree and turns matching files into documents.
///
/// Files are visited in sorted path order. A file that cannot be read is
/// logged and skipped; the rest of the tree is still ingested.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    tag: String,
    extensions: Vec<String>,
    max_file_size: u64,
    name_contains: Option<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = SourceSettings::default();
        Self {
            root: root.into(),
            tag: "local".to_string(),
            extensions: defaults.extensions,
            max_file_size: defaults.max_file_size,
            name_contains: None,
        }
    }

    pub fn from_settings(root: impl Into<PathBuf>, settings: &SourceSettings) -> Self {
        Self {
            root: root.into(),
            tag: "local".to_string(),
            extensions: settings.extensions.clone(),
            max_file_size: settings.max_file_size,
            name_contains: settings.name_contains.clone(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self { self.tag = tag.into(); self }
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self { self.extensions = extensions; self }
    pub fn with_max_file_size(mut self, bytes: u64) -> Self { self.max_file_size = bytes; self }
    pub fn with_name_filter(mut self, needle: impl Into<String>) -> Self { self.name_contains = Some(needle.into()); self }

    fn list_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let ext_ok = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if !ext_ok { continue; }
            if let Some(needle) = &self.name_contains {
                let name = entry.file_name().to_string_lossy();
                if !name.contains(needle.as_str()) { continue; }
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        files
    }

    fn read_document(&self, path: &Path) -> Result<Option<Document>> {
        let size = fs::metadata(path)?.len();
        if size > self.max_file_size {
            warn!(path = %path.display(), size, limit = self.max_file_size, "skipping oversized file");
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_string_lossy().replace('\\', "/");
        let doc = Document::new(&self.tag, relative.clone(), format!("File: {relative}\n{text}"))?;
        Ok(Some(doc))
    }
}

impl DocumentSource for DirectorySource {
    fn source_tag(&self) -> &str { &self.tag }

    fn list_documents(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source directory {} does not exist", self.root.display()),
            )));
        }
        let mut docs = Vec::new();
        for path in self.list_files() {
            match self.read_document(&path) {
                Ok(Some(doc)) => docs.push(doc),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }
        Ok(docs)
    }
}

/// Reads one JSON object per line: `{"source_tag": .., "id": .., "text": ..}`.
///
/// `source_tag` may be omitted, in which case the adapter's own tag is used.
/// Blank lines are ignored; any other malformed line rejects the whole file.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
    tag: String,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), tag: "jsonl".to_string() }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self { self.tag = tag.into(); self }
}

impl DocumentSource for JsonlSource {
    fn source_tag(&self) -> &str { &self.tag }

    fn list_documents(&self) -> Result<Vec<Document>> {
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut docs = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let at = |msg: String| Error::InvalidDocument(format!("{}:{}: {}", self.path.display(), lineno + 1, msg));
            let mut record: DocumentRecord = serde_json::from_str(&line).map_err(|e| at(e.to_string()))?;
            if record.source_tag.is_none() { record.source_tag = Some(self.tag.clone()); }
            let doc = Document::try_from(record).map_err(|e| match e {
                Error::InvalidDocument(msg) => at(msg),
                other => other,
            })?;
            docs.push(doc);
        }
        Ok(docs)
    }
}

/// A fixed, in-memory list of documents.
#[derive(Debug, Clone)]
pub struct StaticSource {
    tag: String,
    docs: Vec<Document>,
}

impl StaticSource {
    pub fn new(tag: impl Into<String>, docs: Vec<Document>) -> Self {
        Self { tag: tag.into(), docs }
    }
}

impl DocumentSource for StaticSource {
    fn source_tag(&self) -> &str { &self.tag }
    fn list_documents(&self) -> Result<Vec<Document>> { Ok(self.docs.clone()) }
}
