use super::basics::ROM_MAX_SIZE;
use std::path::Path;
use thiserror::Error;

/// Metadata captured when a ROM is loaded.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct RomInfo {
    pub path: String,
    /// File name without directories or extension.
    pub name: String,
    /// Extension including the leading dot, empty if there is none.
    pub ext: String,
    pub size: usize,
}

impl RomInfo {
    pub fn from_path(path: &Path, size: usize) -> RomInfo {
        let base = base_name(path);
        let (name, ext) = match base.rfind('.') {
            Some(dot) => (base[..dot].to_string(), base[dot..].to_string()),
            None => (base.clone(), String::new()),
        };
        RomInfo {
            path: path.to_string_lossy().into_owned(),
            name,
            ext,
            size,
        }
    }
}

/// Last component of a path, used in messages so full paths stay out of logs.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Status codes a ROM-loading caller branches on.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum StatusCode {
    Ok,
    FileNotFound,
    FileNotGood,
    InvalidFileSize,
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RomError {
    #[error("ROM {0} was not found")]
    FileNotFound(String),
    #[error("ROM {0} could not be opened for reading")]
    FileNotGood(String),
    #[error("ROM {name} has an invalid size of {size} bytes, expected 1 to 3584")]
    InvalidFileSize { name: String, size: usize },
}

impl RomError {
    pub fn status(&self) -> StatusCode {
        match self {
            RomError::FileNotFound(_) => StatusCode::FileNotFound,
            RomError::FileNotGood(_) => StatusCode::FileNotGood,
            RomError::InvalidFileSize { .. } => StatusCode::InvalidFileSize,
        }
    }
}

/// Collapses a load result into its status code.
pub fn status_of(result: &Result<(), RomError>) -> StatusCode {
    match result {
        Ok(()) => StatusCode::Ok,
        Err(err) => err.status(),
    }
}

pub fn check_size(name: &str, size: usize) -> Result<(), RomError> {
    if size == 0 || size > ROM_MAX_SIZE {
        return Err(RomError::InvalidFileSize {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}
