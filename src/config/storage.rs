use crate::core::Storage;
use crate::utils::error::{QuantError, Result};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

/// Reads inputs from the local filesystem and writes artifacts under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    type Reader = File;

    fn open(&self, path: &str) -> Result<File> {
        File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => QuantError::FileNotFound {
                path: path.to_string(),
            },
            _ => QuantError::FileReadFailure {
                path: path.to_string(),
                source,
            },
        })
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        Ok(full_path.display().to_string())
    }
}
