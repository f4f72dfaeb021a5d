//! Downloadable artifacts built from the current render.
//!
//! Exports read the model; they never touch viewport or render state. Delivery goes through the
//! host: mint an object URL, trigger the download, and revoke the URL once the platform had time
//! to pick it up. URLs still waiting for revocation are tracked so teardown can release them.

#[cfg(feature = "raster")]
pub mod raster;

use crate::host::{Blob, HostError, ObjectUrl, ViewerHost};
use std::cell::RefCell;
use std::time::Duration;

pub const SVG_MIME: &str = "image/svg+xml";
pub const PNG_MIME: &str = "image/png";
pub const PDF_MIME: &str = "application/pdf";

/// How long an object URL stays alive after its download was triggered.
pub const REVOKE_GRACE: Duration = Duration::from_millis(1_000);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
    #[error("raster export timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error(transparent)]
    Host(#[from] HostError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Vector,
    Raster,
    Document,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Vector => "svg",
            ExportFormat::Raster => "png",
            ExportFormat::Document => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Vector => SVG_MIME,
            ExportFormat::Raster => PNG_MIME,
            ExportFormat::Document => PDF_MIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl Artifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>, title: Option<&str>) -> Self {
        Self {
            bytes,
            mime: format.mime(),
            filename: export_filename(title, format),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded { filename: String },
    /// There was no successful render to export. Not an error.
    NothingRendered,
    /// The viewer was torn down while the artifact was being produced.
    Abandoned,
}

/// `<slugified title>.<ext>`, or `diagram.<ext>` when the diagram has no usable title.
pub fn export_filename(title: Option<&str>, format: ExportFormat) -> String {
    let mut slug = String::new();
    for ch in title.unwrap_or_default().trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let stem = if slug.is_empty() { "diagram" } else { slug };
    format!("{stem}.{}", format.extension())
}

/// The vector artifact is the engine's markup, byte for byte.
pub fn vector_artifact(markup: &str, title: Option<&str>) -> Artifact {
    Artifact::new(ExportFormat::Vector, markup.as_bytes().to_vec(), title)
}

/// Object URLs minted for downloads and not yet revoked.
#[derive(Debug, Default)]
pub struct Downloads {
    outstanding: RefCell<Vec<ObjectUrl>>,
}

impl Downloads {
    pub fn outstanding(&self) -> usize {
        self.outstanding.borrow().len()
    }

    fn track(&self, url: ObjectUrl) {
        self.outstanding.borrow_mut().push(url);
    }

    /// Stops tracking `url`; returns whether it was still outstanding.
    fn release(&self, url: &ObjectUrl) -> bool {
        let mut outstanding = self.outstanding.borrow_mut();
        match outstanding.iter().position(|u| u == url) {
            Some(i) => {
                outstanding.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Hands `artifact` to the host as a download.
    ///
    /// The URL is revoked after [`REVOKE_GRACE`] (revoking synchronously after triggering can
    /// cancel the download), or right away when triggering failed.
    pub async fn deliver<H: ViewerHost + ?Sized>(
        &self,
        host: &H,
        artifact: Artifact,
    ) -> Result<ExportOutcome> {
        let url = host.create_object_url(&Blob {
            bytes: artifact.bytes,
            mime: artifact.mime,
        });
        self.track(url.clone());

        let triggered = host.trigger_download(&url, &artifact.filename);
        if triggered.is_ok() {
            host.delay(REVOKE_GRACE).await;
        }
        if self.release(&url) {
            host.revoke_object_url(&url);
        }

        triggered?;
        tracing::debug!(filename = %artifact.filename, mime = artifact.mime, "export delivered");
        Ok(ExportOutcome::Downloaded {
            filename: artifact.filename,
        })
    }

    /// Revokes every outstanding URL. Deliveries still waiting on their grace period will find
    /// their URL gone and skip the second revoke.
    pub fn revoke_all<H: ViewerHost + ?Sized>(&self, host: &H) {
        let urls = std::mem::take(&mut *self.outstanding.borrow_mut());
        for url in urls {
            host.revoke_object_url(&url);
        }
    }
}
