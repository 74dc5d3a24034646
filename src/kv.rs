use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode store: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value persistence. `get` returns `None` for absent keys.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), KvError>;
}

#[derive(Debug, Default)]
pub struct MemoryKv {
    data: HashMap<String, String>,
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), KvError> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }
}

/// All keys live in one JSON object file, rewritten in full on every `set`.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    data: HashMap<String, String>,
}

impl FileKv {
    pub fn open<P>(path: P) -> Result<Self, KvError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    warn!("ignoring corrupt store file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(KvError::Io { path, source }),
        };
        Ok(FileKv { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), KvError> {
        let io_err = |source: io::Error| KvError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(io_err)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec(&self.data)?;
        fs::write(&tmp_path, bytes).map_err(io_err)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Windows refuses to rename over an existing file
                if self.path.exists() {
                    fs::remove_file(&self.path).map_err(io_err)?;
                    fs::rename(&tmp_path, &self.path).map_err(io_err)
                } else {
                    Err(io_err(rename_err))
                }
            }
        }
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), KvError> {
        let previous = self.data.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.data.insert(key.to_string(), previous),
                None => self.data.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
