//! Bills list page: retrieval, display transform, receipt preview and download.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use shared::{domain::Route, protocol::RawBill};
use tracing::{debug, error, info, warn};

use crate::{
    download::download_file_name,
    error::{FormatError, RetrieveError},
    format::{format_date, format_status},
    session::SessionContext,
    DownloadSink, FileFetcher, Navigator, PreviewSurface, RemoteStore,
};

/// Share of the preview container a receipt image occupies.
const PREVIEW_WIDTH_RATIO: f64 = 0.5;

/// A stored bill prepared for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBill {
    /// The stored record with `date` and `status` replaced by their display forms.
    pub bill: RawBill,
    /// Date exactly as stored; list ordering uses it.
    pub raw_date: String,
}

impl DisplayBill {
    pub fn date(&self) -> &str {
        &self.bill.date
    }

    pub fn status(&self) -> &str {
        &self.bill.status
    }

    pub fn icon(&self) -> Option<BillIcon> {
        self.bill.receipt_url().map(BillIcon::new)
    }
}

/// Clickable receipt affordance of a list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillIcon {
    pub bill_url: String,
}

impl BillIcon {
    pub fn new(bill_url: impl Into<String>) -> Self {
        Self {
            bill_url: bill_url.into(),
        }
    }
}

/// Converts a stored bill into its display form.
///
/// A date that cannot be formatted is kept as stored and logged. Status
/// formatting is not guarded on that fallback path, so an unknown status
/// still fails the whole record.
pub fn transform_bill(raw: RawBill) -> Result<DisplayBill, FormatError> {
    let raw_date = raw.date.clone();
    let formatted = format_date(&raw.date)
        .and_then(|date| format_status(&raw.status).map(|status| (date, status)));

    let (date, status) = match formatted {
        Ok(formatted) => formatted,
        Err(err) => {
            warn!(error = %err, record = ?raw, "failed to format bill, keeping stored date");
            (raw.date.clone(), format_status(&raw.status)?)
        }
    };

    Ok(DisplayBill {
        bill: RawBill {
            date,
            status: status.to_string(),
            ..raw
        },
        raw_date,
    })
}

/// Orders bills newest first by their stored date string.
pub fn sort_for_display(bills: &mut [DisplayBill]) {
    bills.sort_by(|a, b| b.raw_date.cmp(&a.raw_date));
}

pub struct BillsListController {
    session: SessionContext,
    store: Option<Arc<dyn RemoteStore>>,
    navigator: Arc<dyn Navigator>,
    preview: Arc<dyn PreviewSurface>,
    fetcher: Arc<dyn FileFetcher>,
    downloads: Arc<dyn DownloadSink>,
}

impl BillsListController {
    pub fn new(
        session: SessionContext,
        store: Option<Arc<dyn RemoteStore>>,
        navigator: Arc<dyn Navigator>,
        preview: Arc<dyn PreviewSurface>,
        fetcher: Arc<dyn FileFetcher>,
        downloads: Arc<dyn DownloadSink>,
    ) -> Self {
        Self {
            session,
            store,
            navigator,
            preview,
            fetcher,
            downloads,
        }
    }

    /// Lists stored bills in received order, transformed for display.
    ///
    /// Store failures are returned untouched; no retry.
    pub async fn retrieve(&self) -> Result<Vec<DisplayBill>, RetrieveError> {
        let Some(store) = &self.store else {
            debug!("no bills store configured");
            return Ok(Vec::new());
        };

        let records = store.list().await?;
        let bills = records
            .into_iter()
            .map(transform_bill)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(email = self.session.email(), count = bills.len(), "bills retrieved");
        Ok(bills)
    }

    pub fn handle_click_new_bill(&self) {
        self.navigator.navigate(Route::NewBill);
    }

    pub fn handle_click_preview(&self, icon: &BillIcon) {
        let width = (self.preview.container_width() * PREVIEW_WIDTH_RATIO)
            .floor()
            .max(0.0) as u32;
        self.preview.show(&icon.bill_url, width);
    }

    /// Downloads the receipt behind `icon`. Failures are logged and yield `None`.
    pub async fn handle_click_download(&self, icon: &BillIcon) -> Option<PathBuf> {
        info!(url = %icon.bill_url, "downloading receipt");
        match self.download(&icon.bill_url).await {
            Ok(path) => {
                info!(path = %path.display(), "download triggered");
                Some(path)
            }
            Err(err) => {
                error!(url = %icon.bill_url, error = %format!("{err:#}"), "failed to download receipt");
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        let bytes = self
            .fetcher
            .fetch(url)
            .await
            .with_context(|| format!("failed to fetch '{url}'"))?;
        self.downloads.save(&download_file_name(url), bytes).await
    }
}

#[cfg(test)]
#[path = "tests/bills_tests.rs"]
mod tests;
