pub mod file;

pub use file::{ByteReader, FileBody, UploadFile};
