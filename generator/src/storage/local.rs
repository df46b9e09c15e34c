use super::StorageError;
use std::{fs, io::ErrorKind, path::Path};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
/// Storage on the local filesystem
pub struct LocalStorage;

impl LocalStorage {
    pub fn create_dir_if_missing(&self, path: &Path) -> Result<bool, StorageError> {
        if path.is_dir() {
            return Ok(false);
        }

        match fs::create_dir(path) {
            Ok(()) => {
                debug!(path = ?path, "Created directory");

                Ok(true)
            }
            // lost a race against someone else creating it
            Err(error) if error.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
            Err(source) => Err(StorageError::CreateDir {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|source| StorageError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        fs::write(path, content).map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
