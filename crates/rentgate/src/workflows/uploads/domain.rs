use std::path::PathBuf;

use serde::Serialize;

/// The three kinds of upload the marketplace accepts. Each has its own form
/// field, directory, file-count ceiling, and content-type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadCategory {
    PropertyMedia,
    IdDocument,
    ProfileImage,
}

impl UploadCategory {
    pub const ALL: [UploadCategory; 3] = [
        UploadCategory::PropertyMedia,
        UploadCategory::IdDocument,
        UploadCategory::ProfileImage,
    ];

    /// Multipart field the files must arrive under.
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadCategory::PropertyMedia => "media",
            UploadCategory::IdDocument => "document",
            UploadCategory::ProfileImage => "image",
        }
    }

    /// Directory below the upload root, also the second URL segment.
    pub fn directory(&self) -> &'static str {
        match self {
            UploadCategory::PropertyMedia => "properties",
            UploadCategory::IdDocument => "documents",
            UploadCategory::ProfileImage => "profiles",
        }
    }

    pub fn max_files(&self) -> usize {
        match self {
            UploadCategory::PropertyMedia => 10,
            UploadCategory::IdDocument | UploadCategory::ProfileImage => 1,
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        let Ok(parsed) = content_type.parse::<mime::Mime>() else {
            return false;
        };
        let is_image = parsed.type_() == mime::IMAGE;
        match self {
            UploadCategory::PropertyMedia => is_image || parsed.type_() == mime::VIDEO,
            UploadCategory::IdDocument => {
                is_image || parsed.essence_str() == mime::APPLICATION_PDF.essence_str()
            }
            UploadCategory::ProfileImage => is_image,
        }
    }

    pub fn rejected_type_message(&self) -> &'static str {
        match self {
            UploadCategory::PropertyMedia => {
                "Only image and video files are allowed for properties"
            }
            UploadCategory::IdDocument => "Only PDF and image files are allowed for documents",
            UploadCategory::ProfileImage => "Only image files are allowed for profiles",
        }
    }

    pub fn missing_files_message(&self) -> &'static str {
        match self {
            UploadCategory::PropertyMedia => "No files uploaded",
            UploadCategory::IdDocument => "No document uploaded",
            UploadCategory::ProfileImage => "No image uploaded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.parse::<mime::Mime>() {
            Ok(parsed) if parsed.type_() == mime::VIDEO => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

/// Part headers of one incoming file, known before its body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub field: String,
    pub original_name: String,
    pub content_type: String,
}

impl IncomingFile {
    pub fn new(
        field: impl Into<String>,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            original_name: original_name.into(),
            content_type: content_type.into(),
        }
    }
}

/// A file body written to a temporary name inside its category directory.
/// It gets its public name only once the whole request has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub field: String,
    pub original_name: String,
    pub content_type: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A file written below the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaUploaded {
    pub message: &'static str,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploaded {
    pub message: &'static str,
    pub document_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageUploaded {
    pub message: &'static str,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_filters_follow_category() {
        assert!(UploadCategory::PropertyMedia.accepts("image/png"));
        assert!(UploadCategory::PropertyMedia.accepts("video/mp4"));
        assert!(!UploadCategory::PropertyMedia.accepts("application/pdf"));

        assert!(UploadCategory::IdDocument.accepts("application/pdf"));
        assert!(UploadCategory::IdDocument.accepts("image/jpeg"));
        assert!(!UploadCategory::IdDocument.accepts("video/mp4"));

        assert!(UploadCategory::ProfileImage.accepts("image/webp"));
        assert!(!UploadCategory::ProfileImage.accepts("application/pdf"));
        assert!(!UploadCategory::ProfileImage.accepts("not a mime"));
    }

    #[test]
    fn media_kind_splits_on_top_level_type() {
        assert_eq!(MediaKind::from_content_type("video/quicktime"), MediaKind::Video);
        assert_eq!(MediaKind::from_content_type("image/gif"), MediaKind::Image);
    }
}
