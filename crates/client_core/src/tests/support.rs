//! Test doubles for the controller capabilities.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex as StdMutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{BillId, Route},
    protocol::{CreateBillRequest, CreateBillResponse, RawBill, UpdateBillRequest},
};
use tokio::sync::{Mutex, Notify};

use crate::{
    AlertSurface, DownloadSink, FileFetcher, Navigator, PreviewSurface, RemoteStore, StoreError,
};

pub(crate) fn fixture_bills() -> Vec<RawBill> {
    serde_json::from_str(include_str!("fixtures/bills.json")).expect("bills fixture")
}

pub(crate) struct TestStore {
    bills: Vec<RawBill>,
    list_error: Option<String>,
    create_response: Option<(String, String)>,
    create_error: Option<String>,
    create_successes: usize,
    update_error: Option<String>,
    create_gate: Option<Arc<Notify>>,
    update_gate: Option<Arc<Notify>>,
    pub(crate) created: Arc<Mutex<Vec<CreateBillRequest>>>,
    pub(crate) updated: Arc<Mutex<Vec<UpdateBillRequest>>>,
}

impl TestStore {
    pub(crate) fn ok() -> Self {
        Self {
            bills: Vec::new(),
            list_error: None,
            create_response: Some(("1234".into(), "path/x".into())),
            create_error: None,
            create_successes: 0,
            update_error: None,
            create_gate: None,
            update_gate: None,
            created: Arc::new(Mutex::new(Vec::new())),
            updated: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_bills(mut self, bills: Vec<RawBill>) -> Self {
        self.bills = bills;
        self
    }

    pub(crate) fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    pub(crate) fn with_create_response(mut self, key: &str, file_path: &str) -> Self {
        self.create_response = Some((key.into(), file_path.into()));
        self
    }

    pub(crate) fn failing_create(mut self, message: impl Into<String>) -> Self {
        self.create_error = Some(message.into());
        self
    }

    /// Lets the first `successes` uploads through, then fails every later one.
    pub(crate) fn failing_create_after(
        mut self,
        successes: usize,
        message: impl Into<String>,
    ) -> Self {
        self.create_successes = successes;
        self.failing_create(message)
    }

    pub(crate) fn failing_update(mut self, message: impl Into<String>) -> Self {
        self.update_error = Some(message.into());
        self
    }

    /// Holds every `create` until the returned notifier fires.
    pub(crate) fn gated_create(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.create_gate = Some(gate.clone());
        (self, gate)
    }

    /// Holds every `update` until the returned notifier fires.
    pub(crate) fn gated_update(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.update_gate = Some(gate.clone());
        (self, gate)
    }
}

#[async_trait]
impl RemoteStore for TestStore {
    async fn list(&self) -> Result<Vec<RawBill>, StoreError> {
        if let Some(message) = &self.list_error {
            return Err(StoreError::Rejected(message.clone()));
        }
        Ok(self.bills.clone())
    }

    async fn create(&self, request: CreateBillRequest) -> Result<CreateBillResponse, StoreError> {
        let attempt = {
            let mut created = self.created.lock().await;
            created.push(request);
            created.len()
        };
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.create_error {
            if attempt > self.create_successes {
                return Err(StoreError::Rejected(message.clone()));
            }
        }
        let (key, file_path) = self.create_response.clone().expect("create response");
        Ok(CreateBillResponse {
            key: BillId(key),
            file_path,
        })
    }

    async fn update(&self, request: UpdateBillRequest) -> Result<(), StoreError> {
        self.updated.lock().await.push(request);
        if let Some(gate) = &self.update_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.update_error {
            return Err(StoreError::Rejected(message.clone()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: StdMutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub(crate) fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes").push(route);
    }
}

#[derive(Default)]
pub(crate) struct RecordingAlerts {
    messages: StdMutex<Vec<String>>,
}

impl RecordingAlerts {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("alerts").clone()
    }
}

impl AlertSurface for RecordingAlerts {
    fn alert(&self, message: &str) {
        self.messages.lock().expect("alerts").push(message.to_string());
    }
}

pub(crate) struct RecordingPreview {
    container_width: f64,
    shown: StdMutex<Vec<(String, u32)>>,
}

impl RecordingPreview {
    pub(crate) fn with_container_width(container_width: f64) -> Self {
        Self {
            container_width,
            shown: StdMutex::new(Vec::new()),
        }
    }

    pub(crate) fn shown(&self) -> Vec<(String, u32)> {
        self.shown.lock().expect("previews").clone()
    }
}

impl PreviewSurface for RecordingPreview {
    fn container_width(&self) -> f64 {
        self.container_width
    }

    fn show(&self, url: &str, width: u32) {
        self.shown
            .lock()
            .expect("previews")
            .push((url.to_string(), width));
    }
}

pub(crate) struct StaticFetcher {
    bytes: Vec<u8>,
    pub(crate) fetched: StdMutex<Vec<String>>,
}

impl StaticFetcher {
    pub(crate) fn serving(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            fetched: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FileFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetched.lock().expect("fetched").push(url.to_string());
        Ok(self.bytes.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryDownloads {
    fail: bool,
    pub(crate) saved: StdMutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDownloads {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            saved: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DownloadSink for MemoryDownloads {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf> {
        if self.fail {
            return Err(anyhow!("disk full"));
        }
        self.saved
            .lock()
            .expect("saved")
            .push((file_name.to_string(), bytes));
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}
