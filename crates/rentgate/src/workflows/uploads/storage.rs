use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::domain::{IncomingFile, MediaKind, StagedFile, StoredFile, UploadCategory};

/// Public URL prefix under which the upload root is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Name prefix of bodies still being received or awaiting acceptance.
const STAGING_PREFIX: &str = ".staging-";

/// Uploads on local disk: `<root>/<category dir>/<field>-<uuid><ext>`.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create every category directory and clear staging files left behind
    /// by an interrupted process.
    pub async fn ensure_layout(&self) -> io::Result<()> {
        for category in UploadCategory::ALL {
            let directory = self.root.join(category.directory());
            fs::create_dir_all(&directory).await?;

            let mut entries = fs::read_dir(&directory).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
                    warn!(path = %entry.path().display(), "removing stale staging file");
                    fs::remove_file(entry.path()).await?;
                }
            }
        }
        Ok(())
    }

    /// Open a staging file for one incoming body.
    pub async fn stage(&self, category: UploadCategory, file: IncomingFile) -> io::Result<Staging> {
        let directory = self.root.join(category.directory());
        fs::create_dir_all(&directory).await?;
        let path = directory.join(format!("{STAGING_PREFIX}{}", Uuid::new_v4()));
        let handle = fs::File::create(&path).await?;

        Ok(Staging {
            handle,
            staged: StagedFile {
                field: file.field,
                original_name: file.original_name,
                content_type: file.content_type,
                path,
                size: 0,
            },
        })
    }

    /// Stage a body that is already in memory.
    pub async fn stage_bytes(
        &self,
        category: UploadCategory,
        file: IncomingFile,
        bytes: &[u8],
    ) -> io::Result<StagedFile> {
        let mut staging = self.stage(category, file).await?;
        if let Err(err) = staging.write(bytes).await {
            staging.abandon().await;
            return Err(err);
        }
        staging.finish().await
    }

    /// Move a staged body to its public name.
    pub async fn promote(
        &self,
        category: UploadCategory,
        staged: &StagedFile,
    ) -> io::Result<StoredFile> {
        let filename = stored_name(category, &staged.original_name);
        let destination = self.root.join(category.directory()).join(&filename);
        fs::rename(&staged.path, destination).await?;
        debug!(%filename, size = staged.size, "upload stored");

        Ok(StoredFile {
            url: format!("{PUBLIC_PREFIX}/{}/{filename}", category.directory()),
            filename,
            original_name: staged.original_name.clone(),
            kind: MediaKind::from_content_type(&staged.content_type),
            size: staged.size,
        })
    }

    pub async fn discard_staged(&self, staged: &StagedFile) -> io::Result<()> {
        fs::remove_file(&staged.path).await
    }

    pub async fn discard(&self, category: UploadCategory, stored: &StoredFile) -> io::Result<()> {
        fs::remove_file(self.root.join(category.directory()).join(&stored.filename)).await
    }

    /// Map a path below `/uploads/` back onto disk. `None` for anything that
    /// would escape the root or name a hidden staging file.
    pub fn locate(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        let mut depth = 0;
        for component in relative.components() {
            match component {
                Component::Normal(part) if !part.to_string_lossy().starts_with('.') => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        (depth > 0).then_some(resolved)
    }
}

/// An open staging file. Dropping it without `finish` or `abandon` leaves
/// the partial body for `ensure_layout` to sweep.
#[derive(Debug)]
pub struct Staging {
    handle: fs::File,
    staged: StagedFile,
}

impl Staging {
    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.staged.size
    }

    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.handle.write_all(chunk).await?;
        self.staged.size += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> io::Result<StagedFile> {
        if let Err(err) = self.handle.flush().await {
            self.abandon().await;
            return Err(err);
        }
        Ok(self.staged)
    }

    /// Close and delete the partial body.
    pub async fn abandon(self) {
        let Staging { handle, staged } = self;
        drop(handle);
        if let Err(err) = fs::remove_file(&staged.path).await {
            warn!(
                path = %staged.path.display(),
                error = %err,
                "could not remove staging file"
            );
        }
    }
}

/// `<field>-<uuid v4><original extension>`; the extension is kept only when
/// it is plain ASCII alphanumerics.
fn stored_name(category: UploadCategory, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}-{}{extension}", category.field_name(), Uuid::new_v4())
}
