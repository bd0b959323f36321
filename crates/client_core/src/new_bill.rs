//! New bill page: receipt upload, then bill submission.
//!
//! The controller walks `Idle → Uploading → Ready → Submitting → Ready`.
//! Submission is only accepted in `Ready`, so a bill can never be sent while
//! its receipt upload is still in flight.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use shared::{
    domain::{BillId, BillStatus, Route},
    protocol::{Bill, CreateBillRequest, UpdateBillRequest},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{session::SessionContext, AlertSurface, Navigator, RemoteStore};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const DEFAULT_PCT: i64 = 20;
pub const MISSING_RECEIPT_ALERT: &str = "Merci de fournir un document en .jpg, .png ou .jpeg";

/// Outcome of the most recent successful receipt upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSession {
    pub bill_id: Option<BillId>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewBillState {
    Idle,
    Uploading,
    Ready,
    Submitting,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("'{}' has no usable file name", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        Ok(Self { name, bytes })
    }
}

/// Raw field values of the new bill form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBillForm {
    pub expense_type: String,
    pub name: String,
    pub amount: String,
    pub date: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

impl NewBillForm {
    pub fn compose_bill(&self, email: &str, file_path: String, file_name: String) -> Bill {
        Bill {
            email: email.to_string(),
            expense_type: self.expense_type.clone(),
            name: self.name.clone(),
            amount: parse_int_prefix(&self.amount),
            date: self.date.clone(),
            vat: self.vat.clone(),
            // Zero counts as unset, like a blank field.
            pct: parse_int_prefix(&self.pct)
                .filter(|pct| *pct != 0)
                .unwrap_or(DEFAULT_PCT),
            commentary: self.commentary.clone(),
            file_path,
            file_name,
            status: BillStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChangeOutcome {
    /// Unsupported extension; nothing was uploaded.
    Rejected,
    Uploaded(UploadSession),
    UploadFailed,
    /// A newer file was selected while this upload was in flight.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    MissingReceipt,
    Busy(NewBillState),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Blocked(BlockReason),
    Submitted { bill: Bill, update: PendingUpdate },
}

/// Handle on a bill update running in the background.
///
/// Dropping it does not cancel the update.
#[derive(Debug)]
pub struct PendingUpdate(Option<JoinHandle<()>>);

impl PendingUpdate {
    fn settled() -> Self {
        Self(None)
    }

    pub fn is_settled(&self) -> bool {
        self.0.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub async fn settle(self) {
        if let Some(handle) = self.0 {
            if let Err(err) = handle.await {
                error!(error = %err, "bill update task failed");
            }
        }
    }
}

struct NewBillInner {
    state: NewBillState,
    upload: UploadSession,
    upload_generation: u64,
}

pub struct NewBillController {
    session: SessionContext,
    store: Option<Arc<dyn RemoteStore>>,
    navigator: Arc<dyn Navigator>,
    alerts: Arc<dyn AlertSurface>,
    inner: Mutex<NewBillInner>,
}

/// Validation decision for a selected receipt: the text after the last `.`
/// must be `jpg`, `jpeg` or `png`, compared case-sensitively. A name with no
/// `.` is its own extension, so a bare `jpg` passes.
pub fn is_supported_extension(file_name: &str) -> bool {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    SUPPORTED_EXTENSIONS.contains(&extension)
}

/// Leading integer of `raw`, ignoring leading whitespace and trailing garbage.
/// Digit runs beyond the `i64` range saturate at its bounds.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].bytes().fold(0i64, |acc, digit| {
        let digit = i64::from(digit - b'0');
        let acc = acc.saturating_mul(10);
        if negative {
            acc.saturating_sub(digit)
        } else {
            acc.saturating_add(digit)
        }
    });
    Some(value)
}

impl NewBillController {
    pub fn new(
        session: SessionContext,
        store: Option<Arc<dyn RemoteStore>>,
        navigator: Arc<dyn Navigator>,
        alerts: Arc<dyn AlertSurface>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            store,
            navigator,
            alerts,
            inner: Mutex::new(NewBillInner {
                state: NewBillState::Idle,
                upload: UploadSession::default(),
                upload_generation: 0,
            }),
        })
    }

    pub async fn state(&self) -> NewBillState {
        self.inner.lock().await.state
    }

    pub async fn upload_session(&self) -> UploadSession {
        self.inner.lock().await.upload.clone()
    }

    /// Validates the selected receipt and uploads it.
    ///
    /// An unsupported extension is a silent no-op. Upload failures are logged
    /// and leave the previous upload, if any, on record.
    pub async fn handle_change_file(&self, file: SelectedFile) -> FileChangeOutcome {
        if !is_supported_extension(&file.name) {
            debug!(file_name = %file.name, "ignoring receipt with unsupported extension");
            return FileChangeOutcome::Rejected;
        }
        let Some(store) = &self.store else {
            warn!(file_name = %file.name, "no bills store configured; receipt not uploaded");
            return FileChangeOutcome::UploadFailed;
        };

        let generation = {
            let mut inner = self.inner.lock().await;
            inner.upload_generation += 1;
            inner.state = NewBillState::Uploading;
            inner.upload_generation
        };

        let file_name = file.name;
        let result = store
            .create(CreateBillRequest {
                file_name: file_name.clone(),
                file_bytes: file.bytes,
                email: self.session.email().to_string(),
                no_content_type: true,
            })
            .await;

        let mut inner = self.inner.lock().await;
        if inner.upload_generation != generation {
            debug!(%file_name, "discarding result of superseded receipt upload");
            return FileChangeOutcome::Superseded;
        }

        match result {
            Ok(response) => {
                info!(bill_id = %response.key, file_path = %response.file_path, "receipt uploaded");
                inner.upload = UploadSession {
                    bill_id: Some(response.key),
                    file_path: Some(response.file_path),
                    file_name: Some(file_name),
                };
                inner.state = NewBillState::Ready;
                FileChangeOutcome::Uploaded(inner.upload.clone())
            }
            Err(err) => {
                error!(error = %err, %file_name, "receipt upload failed");
                inner.state = if inner.upload.file_path.is_some() {
                    NewBillState::Ready
                } else {
                    NewBillState::Failed
                };
                FileChangeOutcome::UploadFailed
            }
        }
    }

    /// Submits the form once a receipt upload is on record.
    ///
    /// Without one, the page is reloaded and the user is alerted. Otherwise
    /// the update is started in the background and the bills list is shown
    /// right away, without waiting for the update to settle.
    pub async fn handle_submit(self: &Arc<Self>, form: &NewBillForm) -> SubmitOutcome {
        let (bill, selector) = {
            let mut inner = self.inner.lock().await;
            let Some(file_path) = inner.upload.file_path.clone() else {
                drop(inner);
                self.navigator.navigate(Route::NewBill);
                self.alerts.alert(MISSING_RECEIPT_ALERT);
                return SubmitOutcome::Blocked(BlockReason::MissingReceipt);
            };
            if inner.state != NewBillState::Ready {
                warn!(state = ?inner.state, "submit ignored until the current operation settles");
                return SubmitOutcome::Blocked(BlockReason::Busy(inner.state));
            }

            let file_name = inner.upload.file_name.clone().unwrap_or_default();
            let bill = form.compose_bill(self.session.email(), file_path, file_name);
            if self.store.is_some() {
                inner.state = NewBillState::Submitting;
            }
            (bill, inner.upload.bill_id.clone())
        };

        let update = self.spawn_update(bill.clone(), selector);
        self.navigator.navigate(Route::Bills);
        SubmitOutcome::Submitted { bill, update }
    }

    /// Sends `bill` to the store, keyed by the uploaded receipt.
    pub async fn update_bill(self: &Arc<Self>, bill: Bill) -> PendingUpdate {
        let selector = self.inner.lock().await.upload.bill_id.clone();
        self.spawn_update(bill, selector)
    }

    fn spawn_update(self: &Arc<Self>, bill: Bill, selector: Option<BillId>) -> PendingUpdate {
        let Some(store) = self.store.clone() else {
            return PendingUpdate::settled();
        };

        let controller = Arc::clone(self);
        PendingUpdate(Some(tokio::spawn(async move {
            controller.run_update(store.as_ref(), bill, selector).await;
            controller.finish_submit().await;
        })))
    }

    async fn run_update(&self, store: &dyn RemoteStore, bill: Bill, selector: Option<BillId>) {
        let Some(selector) = selector else {
            error!("bill update skipped: no uploaded receipt key");
            return;
        };
        let data = match serde_json::to_string(&bill) {
            Ok(data) => data,
            Err(err) => {
                error!(error = %err, "failed to serialize bill");
                return;
            }
        };

        match store
            .update(UpdateBillRequest {
                data,
                selector: selector.clone(),
            })
            .await
        {
            Ok(()) => {
                info!(%selector, "bill updated");
                self.navigator.navigate(Route::Bills);
            }
            Err(err) => error!(%selector, error = %err, "bill update failed"),
        }
    }

    async fn finish_submit(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == NewBillState::Submitting {
            inner.state = NewBillState::Ready;
        }
    }
}

#[cfg(test)]
#[path = "tests/new_bill_tests.rs"]
mod tests;
