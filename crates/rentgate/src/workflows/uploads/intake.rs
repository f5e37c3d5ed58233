use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::warn;

use super::domain::{IncomingFile, StagedFile, UploadCategory};
use super::service::UploadError;
use super::storage::DiskStore;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Stream the files of one multipart request into staging files. Text
/// fields and empty file inputs are skipped. Each part's field name, count,
/// and content type are checked from its headers before any of its body is
/// read, and a body longer than `max_file_bytes` aborts the read. On error
/// nothing staged by this request is left on disk.
pub async fn read_files(
    mut multipart: Multipart,
    store: &DiskStore,
    category: UploadCategory,
    max_file_bytes: u64,
) -> Result<Vec<StagedFile>, UploadError> {
    let mut staged = Vec::new();
    match stage_parts(&mut multipart, store, category, max_file_bytes, &mut staged).await {
        Ok(()) => Ok(staged),
        Err(err) => {
            discard_staged(store, &staged).await;
            Err(err)
        }
    }
}

/// Remove staged bodies that will not be promoted.
pub(crate) async fn discard_staged(store: &DiskStore, files: &[StagedFile]) {
    for file in files {
        if let Err(err) = store.discard_staged(file).await {
            warn!(path = %file.path.display(), error = %err, "could not remove staging file");
        }
    }
}

async fn stage_parts(
    multipart: &mut Multipart,
    store: &DiskStore,
    category: UploadCategory,
    max_file_bytes: u64,
    staged: &mut Vec<StagedFile>,
) -> Result<(), UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, max_file_bytes))?
    {
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let name = field.name().unwrap_or_default().to_string();
        if name != category.field_name() {
            return Err(UploadError::Invalid(format!("Unexpected field '{name}'")));
        }
        if staged.len() == category.max_files() {
            return Err(UploadError::too_many(category));
        }
        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        if !category.accepts(&content_type) {
            return Err(UploadError::Invalid(
                category.rejected_type_message().to_string(),
            ));
        }

        let incoming = IncomingFile::new(name, original_name, content_type);
        staged.push(stream_body(field, store, category, incoming, max_file_bytes).await?);
    }
    Ok(())
}

/// Copy one part body chunk by chunk. The partial file is removed when the
/// body runs past the limit or the stream fails.
async fn stream_body(
    mut field: Field<'_>,
    store: &DiskStore,
    category: UploadCategory,
    incoming: IncomingFile,
    max_file_bytes: u64,
) -> Result<StagedFile, UploadError> {
    let mut staging = store.stage(category, incoming).await?;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                staging.abandon().await;
                return Err(multipart_error(err, max_file_bytes));
            }
        };
        if staging.size() + chunk.len() as u64 > max_file_bytes {
            staging.abandon().await;
            return Err(UploadError::TooLarge {
                limit_bytes: max_file_bytes,
            });
        }
        if let Err(err) = staging.write(&chunk).await {
            staging.abandon().await;
            return Err(UploadError::Storage(err));
        }
    }
    Ok(staging.finish().await?)
}

fn multipart_error(err: MultipartError, max_file_bytes: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge {
            limit_bytes: max_file_bytes,
        }
    } else {
        UploadError::Malformed(err.body_text())
    }
}
