use anyhow::{anyhow, Result};
use axum::extract::multipart::Field;
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, warn};

const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Writes an upload to disk chunk by chunk.
pub struct FileUploader {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl FileUploader {
    pub async fn new(path: PathBuf) -> Result<Self> {
        let file = File::create(&path)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", path.display(), e))?;

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<()> {
        self.writer
            .write_all(&chunk)
            .await
            .map_err(|e| anyhow!("Failed to write upload: {}", e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file and returns the number of bytes written.
    pub async fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .await
            .map_err(|e| anyhow!("Failed to flush upload: {}", e))?;
        Ok(self.written)
    }

    /// Discards the partially written file.
    pub async fn abort(self) {
        drop(self.writer);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!("Failed to remove partial upload {}: {}", self.path.display(), e);
        }
    }
}

/// Streams a multipart field into `path`, returning the byte count.
///
/// On a broken stream the partial file is removed and the multipart error
/// is returned so the caller can map its status code.
pub async fn stream_to_file(
    mut field: Field<'_>,
    path: &Path,
) -> std::result::Result<u64, UploadError> {
    let mut uploader = FileUploader::new(path.to_path_buf())
        .await
        .map_err(UploadError::Storage)?;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                error!("Stream error: {}", e);
                uploader.abort().await;
                return Err(UploadError::Stream(e));
            }
        };

        if let Err(e) = uploader.write_chunk(chunk).await {
            error!("Upload error: {}", e);
            uploader.abort().await;
            return Err(UploadError::Storage(e));
        }
    }

    uploader.finish().await.map_err(UploadError::Storage)
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload interrupted: {0}")]
    Stream(#[from] axum::extract::multipart::MultipartError),

    #[error("{0}")]
    Storage(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uploader_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");

        let mut uploader = FileUploader::new(path.clone()).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"hello ")).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"world")).await.unwrap();
        let written = uploader.finish().await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn abort_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");

        let mut uploader = FileUploader::new(path.clone()).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"partial")).await.unwrap();
        uploader.abort().await;

        assert!(!path.exists());
    }
}
