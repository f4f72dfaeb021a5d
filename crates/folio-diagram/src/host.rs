//! Platform capabilities the viewer needs from its host (browser shell, native window, tests).

use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("fullscreen request rejected: {reason}")]
    FullscreenDenied { reason: String },
    #[error("download failed: {reason}")]
    DownloadFailed { reason: String },
}

/// Handle for a pair of document-level pointer move/up listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Object URL minted by the host for a blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

pub trait ViewerHost {
    /// Asks the platform to show the viewer container fullscreen. Success means the request was
    /// accepted, not that the switch happened; the platform reports that through
    /// `DiagramViewer::on_fullscreen_change`.
    fn request_fullscreen(&self) -> Result<(), HostError>;

    fn exit_fullscreen(&self) -> Result<(), HostError>;

    /// Starts routing pointer move/up events from the whole document to the viewer, so a drag
    /// that leaves the viewer bounds still completes.
    fn listen_document_pointer(&self) -> ListenerId;

    fn unlisten_document_pointer(&self, id: ListenerId);

    fn create_object_url(&self, blob: &Blob) -> ObjectUrl;

    fn trigger_download(&self, url: &ObjectUrl, filename: &str) -> Result<(), HostError>;

    fn revoke_object_url(&self, url: &ObjectUrl);

    /// A timer future, used to bound asynchronous export steps.
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

impl<H: ViewerHost + ?Sized> ViewerHost for Rc<H> {
    fn request_fullscreen(&self) -> Result<(), HostError> {
        (**self).request_fullscreen()
    }

    fn exit_fullscreen(&self) -> Result<(), HostError> {
        (**self).exit_fullscreen()
    }

    fn listen_document_pointer(&self) -> ListenerId {
        (**self).listen_document_pointer()
    }

    fn unlisten_document_pointer(&self, id: ListenerId) {
        (**self).unlisten_document_pointer(id)
    }

    fn create_object_url(&self, blob: &Blob) -> ObjectUrl {
        (**self).create_object_url(blob)
    }

    fn trigger_download(&self, url: &ObjectUrl, filename: &str) -> Result<(), HostError> {
        (**self).trigger_download(url, filename)
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        (**self).revoke_object_url(url)
    }

    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        (**self).delay(duration)
    }
}
