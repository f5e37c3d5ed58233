
use std::path::Path;
use std::sync::Arc;

use crate::workflows::access::AccessGate;
use crate::workflows::accounts::{TokenIssuer, UserRepository};
use crate::workflows::uploads::{DiskStore, IncomingFile, StagedFile, UploadCategory, UploadService};

pub(super) const ONE_MB: u64 = 1024 * 1024;

pub(super) fn build_service<U>(
    users: Arc<U>,
    issuer: Arc<TokenIssuer>,
    root: &Path,
    max_file_bytes: u64,
) -> UploadService<U>
where
    U: UserRepository + 'static,
{
    let gate = AccessGate::new(users.clone(), issuer);
    UploadService::new(users, DiskStore::new(root), gate, max_file_bytes)
}

pub(super) async fn staged(
    store: &DiskStore,
    category: UploadCategory,
    field: &str,
    name: &str,
    content_type: &str,
    bytes: &[u8],
) -> StagedFile {
    store
        .stage_bytes(category, IncomingFile::new(field, name, content_type), bytes)
        .await
        .expect("body staged")
}

/// Entries in a directory, staging files included.
pub(super) fn files_in(directory: &Path) -> usize {
    std::fs::read_dir(directory).map_or(0, |entries| entries.count())
}
