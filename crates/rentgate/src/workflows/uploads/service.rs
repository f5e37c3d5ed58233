use std::io;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::workflows::access::{AccessError, AccessGate};
use crate::workflows::accounts::{User, UserRepository};
use crate::workflows::http::error_response;
use crate::workflows::store::RepositoryError;

use super::domain::{
    DocumentUploaded, MediaUploaded, ProfileImageUploaded, StagedFile, StoredFile,
    UploadCategory,
};
use super::intake::discard_staged;
use super::storage::DiskStore;

/// Slack on top of the file bodies for multipart framing and text fields.
const BODY_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Accepts property media, identity documents, and profile images, and
/// records document/profile paths on the uploading account.
pub struct UploadService<U> {
    users: Arc<U>,
    store: DiskStore,
    gate: AccessGate<U>,
    max_file_bytes: u64,
}

impl<U> UploadService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>, store: DiskStore, gate: AccessGate<U>, max_file_bytes: u64) -> Self {
        Self {
            users,
            store,
            gate,
            max_file_bytes,
        }
    }

    pub fn gate(&self) -> &AccessGate<U> {
        &self.gate
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Request body ceiling for one category: its file count at full size.
    /// Bodies are streamed to disk, so this bounds disk use per request.
    pub fn body_limit(&self, category: UploadCategory) -> usize {
        let files = category.max_files() as u64;
        usize::try_from(self.max_file_bytes.saturating_mul(files) + BODY_OVERHEAD_BYTES)
            .unwrap_or(usize::MAX)
    }

    pub async fn upload_property_media(
        &self,
        user: &User,
        files: Vec<StagedFile>,
    ) -> Result<MediaUploaded, UploadError> {
        let stored = self.accept(UploadCategory::PropertyMedia, files).await?;
        info!(user_id = %user.id, count = stored.len(), "property media uploaded");
        Ok(MediaUploaded {
            message: "Files uploaded successfully",
            files: stored,
        })
    }

    pub async fn upload_id_document(
        &self,
        user: &User,
        files: Vec<StagedFile>,
    ) -> Result<DocumentUploaded, UploadError> {
        let document_url = self
            .attach(user, UploadCategory::IdDocument, files, |account, url| {
                account.id_proof_document = Some(url)
            })
            .await?;
        Ok(DocumentUploaded {
            message: "ID proof document uploaded successfully",
            document_url,
        })
    }

    pub async fn upload_profile_image(
        &self,
        user: &User,
        files: Vec<StagedFile>,
    ) -> Result<ProfileImageUploaded, UploadError> {
        let image_url = self
            .attach(user, UploadCategory::ProfileImage, files, |account, url| {
                account.profile_image = Some(url)
            })
            .await?;
        Ok(ProfileImageUploaded {
            message: "Profile image uploaded successfully",
            image_url,
        })
    }

    /// Store a single file and point the account at it. The file is removed
    /// again when the account update fails.
    async fn attach(
        &self,
        user: &User,
        category: UploadCategory,
        files: Vec<StagedFile>,
        apply: impl FnOnce(&mut User, String),
    ) -> Result<String, UploadError> {
        let stored = self
            .accept(category, files)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UploadError::Invalid(category.missing_files_message().to_string()))?;

        let updated = self.users.fetch(&user.id).and_then(|current| {
            let mut current = current.ok_or(RepositoryError::NotFound)?;
            apply(&mut current, stored.url.clone());
            self.users.update(current)
        });
        if let Err(err) = updated {
            self.discard(category, &stored).await;
            return Err(err.into());
        }

        info!(
            user_id = %user.id,
            category = category.directory(),
            url = %stored.url,
            "account file attached"
        );
        Ok(stored.url)
    }

    /// Every staged file is checked before any gets a public name. Staged
    /// bodies that are not promoted are removed.
    async fn accept(
        &self,
        category: UploadCategory,
        files: Vec<StagedFile>,
    ) -> Result<Vec<StoredFile>, UploadError> {
        if let Err(err) = self.check(category, &files) {
            discard_staged(&self.store, &files).await;
            return Err(err);
        }

        let mut stored = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            match self.store.promote(category, file).await {
                Ok(saved) => stored.push(saved),
                Err(err) => {
                    for written in &stored {
                        self.discard(category, written).await;
                    }
                    discard_staged(&self.store, &files[index..]).await;
                    return Err(UploadError::Storage(err));
                }
            }
        }
        Ok(stored)
    }

    fn check(&self, category: UploadCategory, files: &[StagedFile]) -> Result<(), UploadError> {
        if files.is_empty() {
            return Err(UploadError::Invalid(
                category.missing_files_message().to_string(),
            ));
        }
        if files.len() > category.max_files() {
            return Err(UploadError::too_many(category));
        }
        for file in files {
            if file.field != category.field_name() {
                return Err(UploadError::Invalid(format!(
                    "Unexpected field '{}'",
                    file.field
                )));
            }
            if file.size > self.max_file_bytes {
                return Err(UploadError::TooLarge {
                    limit_bytes: self.max_file_bytes,
                });
            }
            if !category.accepts(&file.content_type) {
                return Err(UploadError::Invalid(
                    category.rejected_type_message().to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn discard(&self, category: UploadCategory, stored: &StoredFile) {
        if let Err(err) = self.store.discard(category, stored).await {
            warn!(filename = %stored.filename, error = %err, "could not remove upload");
        }
    }
}

/// Error raised by the upload service.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Invalid(String),
    #[error("File too large (limit {} MB)", limit_bytes / (1024 * 1024))]
    TooLarge { limit_bytes: u64 },
    #[error("malformed multipart request: {0}")]
    Malformed(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("upload storage failed: {0}")]
    Storage(#[from] io::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl UploadError {
    pub(crate) fn too_many(category: UploadCategory) -> Self {
        UploadError::Invalid(format!(
            "At most {} file(s) may be uploaded to '{}'",
            category.max_files(),
            category.field_name()
        ))
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Invalid(_) | UploadError::Malformed(_) => {
                error_response(StatusCode::BAD_REQUEST, "validation", self.to_string())
            }
            UploadError::TooLarge { .. } => error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                self.to_string(),
            ),
            UploadError::Access(err) => err.into_response(),
            UploadError::Storage(_) | UploadError::Repository(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                self.to_string(),
            ),
        }
    }
}
