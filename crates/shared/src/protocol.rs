use serde::{Deserialize, Serialize};

use crate::domain::{BillId, BillStatus};

/// A bill record exactly as the backend stores it.
///
/// Every field tolerates absence: corrupted or partial records must still
/// reach the display transform, which decides how to render them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBill {
    #[serde(alias = "key", skip_serializing_if = "Option::is_none")]
    pub id: Option<BillId>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub date: String,
    pub vat: Option<String>,
    pub pct: Option<i64>,
    pub commentary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_admin: Option<String>,
}

impl RawBill {
    /// Location of the receipt, preferring the public URL over the storage path.
    pub fn receipt_url(&self) -> Option<&str> {
        self.file_url.as_deref().or(self.file_path.as_deref())
    }
}

/// Payload sent with `update` once the receipt upload has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub email: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub name: String,
    /// `None` serializes to `null`, which is what a non-numeric amount field yields.
    pub amount: Option<i64>,
    pub date: String,
    pub vat: String,
    pub pct: i64,
    pub commentary: String,
    pub file_path: String,
    pub file_name: String,
    pub status: BillStatus,
}

/// Multipart receipt upload: the file part plus the uploader's email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBillRequest {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub email: String,
    /// The transport must not force a content type so the multipart boundary survives.
    pub no_content_type: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillResponse {
    pub key: BillId,
    #[serde(alias = "fileUrl")]
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBillRequest {
    /// JSON-serialized [`Bill`].
    pub data: String,
    pub selector: BillId,
}
