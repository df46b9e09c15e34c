use super::StorageError;
use std::{
    collections::{BTreeMap, BTreeSet},
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default)]
/// In-memory stand-in for the filesystem, follows the same rules as `LocalStorage`
/// with respect to missing parents and existing entries
pub struct MemoryStorage {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.parent().is_none()
}

impl MemoryStorage {
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &Vec<u8>)> {
        self.files.iter()
    }

    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.directories.iter()
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        is_root(path) || self.directories.contains(path)
    }

    fn parent_exists(&self, path: &Path) -> bool {
        path.parent().map_or(true, |parent| self.is_dir(parent))
    }

    pub fn create_dir_if_missing(&mut self, path: &Path) -> Result<bool, StorageError> {
        if self.is_dir(path) {
            return Ok(false);
        }

        let failure = |kind: ErrorKind, message: &str| StorageError::CreateDir {
            path: path.to_path_buf(),
            source: Error::new(kind, message.to_string()),
        };

        if self.files.contains_key(path) {
            Err(failure(ErrorKind::AlreadyExists, "a file exists at this path"))
        } else if !self.parent_exists(path) {
            Err(failure(ErrorKind::NotFound, "parent directory does not exist"))
        } else {
            self.directories.insert(path.to_path_buf());

            Ok(true)
        }
    }

    pub fn create_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        let mut missing = path
            .ancestors()
            .take_while(|ancestor| !self.is_dir(ancestor))
            .map(Path::to_path_buf)
            .collect::<Vec<_>>();

        // create from the outermost ancestor inwards
        while let Some(directory) = missing.pop() {
            self.create_dir_if_missing(&directory)?;
        }

        Ok(())
    }

    pub fn write(&mut self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        let failure = |kind: ErrorKind, message: &str| StorageError::Write {
            path: path.to_path_buf(),
            source: Error::new(kind, message.to_string()),
        };

        if self.directories.contains(path) {
            Err(failure(ErrorKind::Other, "a directory exists at this path"))
        } else if !self.parent_exists(path) {
            Err(failure(ErrorKind::NotFound, "parent directory does not exist"))
        } else {
            self.files.insert(path.to_path_buf(), content.to_vec());

            Ok(())
        }
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::Read {
                path: path.to_path_buf(),
                source: Error::new(ErrorKind::NotFound, "no such file"),
            })
    }
}
