use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::error::ScanError;

/// One image capture, either user-selected or device-sampled.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "frame.jpg".to_string(),
        }
    }

    pub fn with_name(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }
}

/// Supplier of raw frame bytes. Reading a frame never mutates pipeline state;
/// absence of a frame is `NoFrameAvailable`, not a hard error.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn sample_frame(&self) -> Result<Frame, ScanError>;
}

/// One-shot source backed by a user-selected file. Sampling re-reads the same
/// path every time.
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn sample_frame(&self) -> Result<Frame, ScanError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|_| ScanError::NoFrameAvailable)?;
        if bytes.is_empty() {
            return Err(ScanError::NoFrameAvailable);
        }
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame.jpg".to_string());
        Ok(Frame::with_name(bytes, file_name))
    }
}

/// Capture-device stand-in: cycles through the image files of a directory in
/// sorted order, one per sample. An empty directory behaves like a device
/// that has not produced a frame yet.
pub struct DirFrameSource {
    files: Vec<PathBuf>,
    cursor: AtomicUsize,
}

impl DirFrameSource {
    pub fn new(dir: &Path) -> Result<Self, ScanError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|_| ScanError::NoFrameAvailable)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_image(path))
            .collect();
        files.sort();
        Ok(Self {
            files,
            cursor: AtomicUsize::new(0),
        })
    }
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("jpg")
            || ext.eq_ignore_ascii_case("jpeg")
            || ext.eq_ignore_ascii_case("png")
    )
}

#[async_trait]
impl FrameSource for DirFrameSource {
    async fn sample_frame(&self) -> Result<Frame, ScanError> {
        if self.files.is_empty() {
            return Err(ScanError::NoFrameAvailable);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.files.len();
        let path = &self.files[index];
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|_| ScanError::NoFrameAvailable)?;
        if bytes.is_empty() {
            return Err(ScanError::NoFrameAvailable);
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame.jpg".to_string());
        Ok(Frame::with_name(bytes, file_name))
    }
}
