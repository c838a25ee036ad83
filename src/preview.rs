//! Inline rendering of downloaded documents.
//!
//! Reviewers inspect a submitted credential without saving it. The
//! reassembled bytes are classified by declared MIME type; renderable kinds
//! become a `data:` URL (or an object URL in the browser) and text is decoded
//! directly. Anything else gets no preview.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::transfer::DownloadedFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Pdf,
    Text,
    Video,
    Audio,
    Unsupported,
}

impl PreviewKind {
    pub fn from_mime(mime_type: &str) -> Self {
        let mime_type = mime_type.trim().to_lowercase();

        if mime_type.starts_with("image/") {
            PreviewKind::Image
        } else if mime_type == "application/pdf" {
            PreviewKind::Pdf
        } else if mime_type.starts_with("text/") || mime_type == "application/json" {
            PreviewKind::Text
        } else if mime_type.starts_with("video/") {
            PreviewKind::Video
        } else if mime_type.starts_with("audio/") {
            PreviewKind::Audio
        } else {
            PreviewKind::Unsupported
        }
    }

    pub fn is_renderable(self) -> bool {
        self != PreviewKind::Unsupported
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    Text { name: String, content: String },
    Embedded { name: String, kind: PreviewKind, url: String },
    Unsupported { name: String, mime_type: String },
}

impl Preview {
    pub fn kind(&self) -> PreviewKind {
        match self {
            Preview::Text { .. } => PreviewKind::Text,
            Preview::Embedded { kind, .. } => *kind,
            Preview::Unsupported { .. } => PreviewKind::Unsupported,
        }
    }
}

/// Builds a preview that embeds the bytes as a `data:` URL.
pub fn build_preview(file: &DownloadedFile) -> Preview {
    build_preview_with(file, |file| data_url(&file.mime_type, &file.bytes))
}

/// Builds a preview, creating embed URLs with `make_url`.
pub fn build_preview_with<F>(file: &DownloadedFile, make_url: F) -> Preview
where
    F: FnOnce(&DownloadedFile) -> String,
{
    match PreviewKind::from_mime(&file.mime_type) {
        PreviewKind::Text => Preview::Text {
            name: file.name.clone(),
            content: String::from_utf8_lossy(&file.bytes).into_owned(),
        },
        PreviewKind::Unsupported => Preview::Unsupported {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        },
        kind => Preview::Embedded {
            name: file.name.clone(),
            kind,
            url: make_url(file),
        },
    }
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}
