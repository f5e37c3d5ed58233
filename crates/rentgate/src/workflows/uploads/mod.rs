//! Uploads: multipart intake for listing media, identity documents, and
//! profile images, stored on local disk and served under `/uploads`.

pub mod domain;
pub mod intake;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use domain::{
    DocumentUploaded, IncomingFile, MediaKind, MediaUploaded, ProfileImageUploaded, StagedFile,
    StoredFile, UploadCategory,
};
pub use router::upload_router;
pub use service::{UploadError, UploadService};
pub use storage::{DiskStore, Staging, PUBLIC_PREFIX};
