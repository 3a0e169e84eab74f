//! File descriptor handed over by the host for every storage operation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Boxed async reader used for streamed uploads.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// File content, either fully buffered or streamed.
#[derive(Default)]
pub enum FileBody {
    #[default]
    Empty,
    Buffer(Bytes),
    Stream(ByteReader),
}

impl FileBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, FileBody::Empty)
    }
}

impl fmt::Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileBody::Empty => f.write_str("Empty"),
            FileBody::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            FileBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A file as the host's media library describes it.
///
/// Only the metadata fields take part in (de)serialization; the body is
/// attached by the caller right before an upload.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    /// Sub-path inside the key, e.g. a thumbnail format folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Logical media-library folder. `"/"` is the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    pub hash: String,
    pub ext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Byte length, when the host knows it up front.
    #[serde(
        default,
        rename = "sizeInBytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    /// Public URL, written after a successful upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip)]
    pub body: FileBody,
}

impl UploadFile {
    pub fn new(hash: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            ext: ext.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_folder_path(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_buffer(mut self, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        self.size = Some(data.len() as u64);
        self.body = FileBody::Buffer(data);
        self
    }

    /// Attach a streamed body. `size` is an optional length hint.
    pub fn with_stream(mut self, reader: ByteReader, size: Option<u64>) -> Self {
        self.size = size;
        self.body = FileBody::Stream(reader);
        self
    }

    /// Take the body out for an upload, cloning buffers and consuming streams.
    pub fn take_body(&mut self) -> FileBody {
        match &self.body {
            FileBody::Buffer(bytes) => FileBody::Buffer(bytes.clone()),
            _ => std::mem::take(&mut self.body),
        }
    }
}
