use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

/// Whole-document access to wherever the timesheet lives.
///
/// `write_all` replaces the previous content in one step; readers never see
/// a partially written document.
pub trait Gateway {
    fn read_all(&self) -> Result<String>;

    fn write_all(&self, text: &str) -> Result<()>;

    fn exists(&self) -> bool;

    /// Human-readable location, used in messages.
    fn location(&self) -> PathBuf;
}

/// Timesheet stored in a file on disk.
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Gateway for FileGateway {
    fn read_all(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LedgerError::NotFound(self.path.clone())),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_all(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        // Write next to the target and rename over it
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, text).map_err(|e| self.io_error(e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.io_error(e));
        }
        log::debug!("wrote {} bytes to {}", text.len(), self.path.display());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// In-memory timesheet (for testing)
#[derive(Default)]
pub struct MemoryGateway {
    content: RefCell<Option<String>>,
    writes: RefCell<usize>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(text: impl Into<String>) -> Self {
        Self {
            content: RefCell::new(Some(text.into())),
            writes: RefCell::new(0),
        }
    }

    pub fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    /// Number of successful `write_all` calls so far.
    pub fn writes(&self) -> usize {
        *self.writes.borrow()
    }
}

impl Gateway for MemoryGateway {
    fn read_all(&self) -> Result<String> {
        self.content
            .borrow()
            .clone()
            .ok_or_else(|| LedgerError::NotFound(self.location()))
    }

    fn write_all(&self, text: &str) -> Result<()> {
        *self.content.borrow_mut() = Some(text.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.content.borrow().is_some()
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn read_all(&self) -> Result<String> {
        (**self).read_all()
    }

    fn write_all(&self, text: &str) -> Result<()> {
        (**self).write_all(text)
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn location(&self) -> PathBuf {
        (**self).location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path().join("sheet.html"));
        assert!(!gateway.exists());
        match gateway.read_all() {
            Err(LedgerError::NotFound(path)) => assert!(path.ends_with("sheet.html")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_write_creates_directories_and_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sheet.html");
        let gateway = FileGateway::new(&path);

        gateway.write_all("first version, longer").unwrap();
        gateway.write_all("second").unwrap();

        assert_eq!(gateway.read_all().unwrap(), "second");
        assert!(!temp_dir.path().join("nested").join("sheet.html.tmp").exists());
    }

    #[test]
    fn test_memory_gateway() {
        let gateway = MemoryGateway::new();
        assert!(!gateway.exists());
        assert!(matches!(gateway.read_all(), Err(LedgerError::NotFound(_))));
        gateway.write_all("x").unwrap();
        assert_eq!(gateway.read_all().unwrap(), "x");
        assert_eq!(gateway.writes(), 1);
    }
}
