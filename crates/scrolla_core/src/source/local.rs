//! Sources backed by local data.

use super::{SourceProvider, SourceRole};
use log::warn;
use std::path::PathBuf;

/// Fixed text; useful for tests and pasted material.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    role: SourceRole,
    text: String,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: SourceRole::Authoritative,
            text: text.into(),
        }
    }

    pub fn with_role(mut self, role: SourceRole) -> Self {
        self.role = role;
        self
    }
}

impl SourceProvider for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> SourceRole {
        self.role
    }

    fn fetch(&self, _topic: &str) -> String {
        self.text.clone()
    }
}

/// Plain-text file read on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    path: PathBuf,
    role: SourceRole,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self {
            name,
            path,
            role: SourceRole::Authoritative,
        }
    }

    pub fn with_role(mut self, role: SourceRole) -> Self {
        self.role = role;
        self
    }
}

impl SourceProvider for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> SourceRole {
        self.role
    }

    fn fetch(&self, _topic: &str) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "event=source_fetch module=source status=error source={} path={} error={}",
                    self.name,
                    self.path.display(),
                    err
                );
                String::new()
            }
        }
    }
}
