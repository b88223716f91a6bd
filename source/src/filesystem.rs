pub use codespan_reporting::files::{Error as FilesError, Files, SimpleFile};

use crate::diagnostics::{Diagnostic, ErrorCode};

use std::fmt::{self, Display};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crossbeam::atomic::AtomicCell;

pub type Result<T> = std::result::Result<T, Diagnostic>;

#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub struct FileId(usize);

#[derive(Debug, Clone)]
pub struct FileName(PathBuf);

impl Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

type File = SimpleFile<FileName, String>;

/// Strip a leading byte order mark and turn CRLF / CR line endings into LF.
/// Every template is normalized before it's stored, so spans always index
/// the normalized text.
pub fn normalize(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// The core data structure for interacting with template sources. Templates
/// can be registered in memory with `load` or read lazily from disk with
/// `resolve`. Reads and writes are safe to share across threads.
pub struct FileSystem {
    next_id: AtomicCell<usize>,
    files: DashMap<FileId, File>,
    ids: DashMap<PathBuf, FileId>,
    paths: DashMap<FileId, PathBuf>,
}

impl Default for FileSystem {
    fn default() -> Self {
        FileSystem::new()
    }
}

impl FileSystem {
    pub fn new() -> Self {
        FileSystem {
            next_id: AtomicCell::new(0),
            files: DashMap::default(),
            ids: DashMap::default(),
            paths: DashMap::default(),
        }
    }

    pub fn id_for_path(&self, path: &Path) -> Option<FileId> {
        self.ids.get(path).map(|id| *id)
    }

    pub fn path_for_id(&self, id: FileId) -> Option<PathBuf> {
        self.paths.get(&id).map(|path| path.to_path_buf())
    }

    /// Whether `path` names a template, either registered in memory or
    /// present on disk.
    pub fn exists(&self, path: &Path) -> bool {
        self.ids.contains_key(path) || path.is_file()
    }

    fn insert(&self, path: &Path, text: &str) -> FileId {
        let fileid = FileId(self.next_id.fetch_add(1));
        let file = File::new(FileName(path.to_path_buf()), normalize(text));
        self.files.insert(fileid, file);
        self.ids.insert(path.to_path_buf(), fileid);
        self.paths.insert(fileid, path.to_path_buf());
        fileid
    }

    /// Register `text` under `path`. Loading a path twice replaces its text
    /// and keeps the original id.
    pub fn load(&self, path: impl AsRef<Path>, text: &str) -> FileId {
        let path = path.as_ref();
        if let Some(fileid) = self.id_for_path(path) {
            let file = File::new(FileName(path.to_path_buf()), normalize(text));
            self.files.insert(fileid, file);
            fileid
        } else {
            self.insert(path, text)
        }
    }

    pub fn resolve(&self, path: &Path) -> Result<FileId> {
        if let Some(fileid) = self.id_for_path(path) {
            return Ok(fileid);
        }
        match fs::read_to_string(path) {
            Ok(source) => Ok(self.insert(path, &source)),
            Err(os_err) => Err(Diagnostic::error()
                .with_code(ErrorCode::ModuleNotFound)
                .with_message(format!("Unable to read {}: {}", path.display(), os_err))),
        }
    }

    pub fn with_source<F, T>(&self, id: FileId, func: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let file = self.files.get(&id).ok_or_else(|| {
            Diagnostic::error().with_message(format!("No source loaded for {:?}", id))
        })?;
        func(file.source())
    }
}

impl<'a> Files<'a> for FileSystem {
    type FileId = FileId;
    type Name = FileName;
    type Source = String;

    fn name(&self, id: FileId) -> std::result::Result<Self::Name, FilesError> {
        let file = self.files.get(&id).ok_or(FilesError::FileMissing)?;
        Ok(file.name().clone())
    }

    fn source(&self, id: FileId) -> std::result::Result<Self::Source, FilesError> {
        let file = self.files.get(&id).ok_or(FilesError::FileMissing)?;
        Ok(file.source().clone())
    }

    fn line_index(
        &self,
        file_id: FileId,
        byte_index: usize,
    ) -> std::result::Result<usize, FilesError> {
        self.files
            .get(&file_id)
            .ok_or(FilesError::FileMissing)?
            .line_index((), byte_index)
    }

    fn line_range(
        &'a self,
        file_id: FileId,
        line_index: usize,
    ) -> std::result::Result<Range<usize>, FilesError> {
        self.files
            .get(&file_id)
            .ok_or(FilesError::FileMissing)?
            .line_range((), line_index)
    }
}
