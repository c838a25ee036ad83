//! # Chunked File Transfer
//!
//! Uploads and downloads credential files in fixed-size chunks. The backend
//! appends chunks by index without reordering, so both directions run
//! strictly sequentially: one chunk in flight, indices in increasing order.
//!
//! ## Upload
//!
//! ```text
//! check_file_exists(name) ── true ──► AlreadyExists (nothing sent)
//!        │ false
//!        ▼
//! upload_file_chunk(name, chunk[i], i, mime)  for i in 0..ceil(N / C)
//! ```
//!
//! A failed chunk stops the sequence. Chunks already sent stay on the
//! backend; there is no rollback.
//!
//! ## Download
//!
//! ```text
//! get_total_chunks(name), get_file_type(name)
//!        ▼
//! get_file_chunk(name, i)  for i in 0..T  ── None / empty ──► MissingChunk
//!        ▼
//! concatenate → DownloadedFile
//! ```
//!
//! Progress is reported after every chunk as `floor(done * 100 / total)`.

use std::ops::Range;

use crate::backend::CanisterBackend;
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MIME_TYPE};
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::models::{TransferMode, TransferProgress};
use crate::utils::sha256_hex;

/// A file picked by the user, read fully into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Declared type, with browsers' empty type mapped to the generic one.
    pub fn declared_type(&self) -> &str {
        if self.mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            &self.mime_type
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub name: String,
    pub size: u64,
    pub chunks: u64,
    pub sha256: String,
}

/// Reassembled file returned by a download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

/// Destination for a finished download, such as the browser's save dialog.
pub trait SaveTarget {
    fn save(&mut self, file: &DownloadedFile) -> AppResult<()>;
}

/// Keeps downloads in memory; used natively and in tests.
impl SaveTarget for Vec<DownloadedFile> {
    fn save(&mut self, file: &DownloadedFile) -> AppResult<()> {
        self.push(file.clone());
        Ok(())
    }
}

pub fn chunk_count(len: usize, chunk_size: usize) -> u64 {
    len.div_ceil(chunk_size) as u64
}

/// Byte ranges of each chunk, in index order.
pub fn chunk_ranges(len: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(chunk_size.max(1))
        .map(move |start| start..(start + chunk_size).min(len))
}

/// Sequential chunked transfer against a backend.
#[derive(Clone, Debug)]
pub struct ChunkedTransfer {
    chunk_size: usize,
    logger: Logger,
}

impl Default for ChunkedTransfer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedTransfer {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            logger: Logger::new("transfer"),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Uploads `file` chunk by chunk.
    ///
    /// `on_progress` is called once with 0% before the first chunk and then
    /// after each acknowledged chunk.
    ///
    /// # Errors
    ///
    /// - `EmptyFile`: the file has no content, nothing is sent
    /// - `AlreadyExists`: the backend already has a file with this name,
    ///   nothing is sent
    /// - any error from the backend; later chunks are not sent
    pub async fn upload<B>(
        &self,
        backend: &B,
        file: &LocalFile,
        on_progress: &mut dyn FnMut(&TransferProgress),
    ) -> AppResult<UploadReceipt>
    where
        B: CanisterBackend + ?Sized,
    {
        if file.bytes.is_empty() {
            return Err(AppError::EmptyFile {
                name: file.name.clone(),
            });
        }

        if backend.check_file_exists(&file.name).await? {
            self.logger.warn(
                "Upload refused, file already exists",
                log_data!("fileName" => file.name),
            );
            return Err(AppError::AlreadyExists {
                name: file.name.clone(),
            });
        }

        let total = chunk_count(file.bytes.len(), self.chunk_size);
        let file_type = file.declared_type();
        let mut progress = TransferProgress::new(TransferMode::Uploading, file.name.clone());
        on_progress(&progress);

        self.logger.info(
            "Starting upload",
            log_data!(
                "fileName" => file.name,
                "totalSize" => file.bytes.len(),
                "totalChunks" => total,
                "contentType" => file_type
            ),
        );

        for (index, range) in chunk_ranges(file.bytes.len(), self.chunk_size).enumerate() {
            let index = index as u64;
            if let Err(e) = backend
                .upload_file_chunk(&file.name, &file.bytes[range], index, file_type)
                .await
            {
                self.logger.error(
                    "Chunk upload failed",
                    log_data!("fileName" => file.name, "chunkIndex" => index, "error" => e.to_string()),
                );
                return Err(e);
            }

            progress.advance(index + 1, total);
            on_progress(&progress);
        }

        let receipt = UploadReceipt {
            name: file.name.clone(),
            size: file.bytes.len() as u64,
            chunks: total,
            sha256: sha256_hex(&file.bytes),
        };

        self.logger.info(
            "Upload completed",
            log_data!("fileName" => receipt.name, "chunks" => receipt.chunks, "sha256" => receipt.sha256),
        );

        Ok(receipt)
    }

    /// Downloads `name` and reassembles it in index order.
    ///
    /// # Errors
    ///
    /// - `MissingChunk`: the backend returned nothing for an index; no
    ///   partial file is produced
    /// - any error from the backend
    pub async fn download<B>(
        &self,
        backend: &B,
        name: &str,
        on_progress: &mut dyn FnMut(&TransferProgress),
    ) -> AppResult<DownloadedFile>
    where
        B: CanisterBackend + ?Sized,
    {
        let mut progress = TransferProgress::new(TransferMode::Downloading, name);
        on_progress(&progress);

        let total = backend.get_total_chunks(name).await?;
        let mime_type = backend
            .get_file_type(name)
            .await?
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        self.logger.info(
            "Starting download",
            log_data!("fileName" => name, "totalChunks" => total, "contentType" => mime_type),
        );

        let mut bytes = Vec::new();
        for index in 0..total {
            match backend.get_file_chunk(name, index).await? {
                Some(chunk) if !chunk.is_empty() => bytes.extend_from_slice(&chunk),
                _ => {
                    self.logger.error(
                        "Chunk missing",
                        log_data!("fileName" => name, "chunkIndex" => index),
                    );
                    return Err(AppError::MissingChunk { index });
                }
            }

            progress.advance(index + 1, total);
            on_progress(&progress);
        }

        self.logger.info(
            "Download completed",
            log_data!("fileName" => name, "size" => bytes.len()),
        );

        Ok(DownloadedFile {
            name: name.to_string(),
            mime_type,
            bytes,
        })
    }
}
