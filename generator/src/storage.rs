mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
/// Backends the generator writes its artifacts to
/// (enum instead of a trait object, mirroring how executors are selected)
pub enum Storage {
    Local(LocalStorage),
    Memory(MemoryStorage),
}

impl Storage {
    pub fn local() -> Self {
        Self::Local(LocalStorage)
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryStorage::default())
    }

    /// create `path` unless it already is a directory, returns whether it was created
    /// the parent has to exist already
    pub fn create_dir_if_missing(&mut self, path: &Path) -> Result<bool, StorageError> {
        match self {
            Self::Local(storage) => storage.create_dir_if_missing(path),
            Self::Memory(storage) => storage.create_dir_if_missing(path),
        }
    }

    /// create `path` and all of its missing parents
    pub fn create_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        match self {
            Self::Local(storage) => storage.create_dir_all(path),
            Self::Memory(storage) => storage.create_dir_all(path),
        }
    }

    /// write `content` to `path`, replacing whatever was there
    pub fn write(&mut self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        match self {
            Self::Local(storage) => storage.write(path, content),
            Self::Memory(storage) => storage.write(path, content),
        }
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::Local(storage) => storage.read(path),
            Self::Memory(storage) => storage.read(path),
        }
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        match self {
            Self::Local(storage) => storage.is_dir(path),
            Self::Memory(storage) => storage.is_dir(path),
        }
    }
}
