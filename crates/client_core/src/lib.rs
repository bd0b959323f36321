use std::path::PathBuf;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::Route,
    protocol::{CreateBillRequest, CreateBillResponse, RawBill, UpdateBillRequest},
};

pub mod bills;
pub mod download;
pub mod error;
pub mod format;
pub mod new_bill;
pub mod session;
pub mod store;

pub use bills::{sort_for_display, transform_bill, BillIcon, BillsListController, DisplayBill};
pub use error::{FormatError, RetrieveError, SessionError, StoreError};
pub use new_bill::{
    is_supported_extension, BlockReason, FileChangeOutcome, NewBillController, NewBillForm,
    NewBillState, PendingUpdate, SelectedFile, SubmitOutcome, UploadSession,
};
pub use session::{SessionContext, SessionStore};

/// Persistence service for bill records.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RawBill>, StoreError>;
    async fn create(&self, request: CreateBillRequest) -> Result<CreateBillResponse, StoreError>;
    async fn update(&self, request: UpdateBillRequest) -> Result<(), StoreError>;
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

impl<F> Navigator for F
where
    F: Fn(Route) + Send + Sync,
{
    fn navigate(&self, route: Route) {
        self(route)
    }
}

/// Surface able to display a receipt image, typically a modal.
pub trait PreviewSurface: Send + Sync {
    /// Width available to the preview, in pixels.
    fn container_width(&self) -> f64;
    fn show(&self, url: &str, width: u32);
}

/// Blocking user-facing message.
pub trait AlertSurface: Send + Sync {
    fn alert(&self, message: &str);
}

#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Destination for downloaded receipts. Returns where the file ended up.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf>;
}

pub struct MissingFileFetcher;

#[async_trait]
impl FileFetcher for MissingFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(anyhow!("no file fetcher available for {url}"))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
