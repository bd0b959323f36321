//! Terminal renditions of the page capabilities.

use std::fmt::Write as _;

use client_core::{AlertSurface, DisplayBill, PreviewSurface, RetrieveError};

pub struct TerminalPreview {
    container_width: f64,
}

impl TerminalPreview {
    pub fn new(container_width: f64) -> Self {
        Self { container_width }
    }
}

impl PreviewSurface for TerminalPreview {
    fn container_width(&self) -> f64 {
        self.container_width
    }

    fn show(&self, url: &str, width: u32) {
        println!("Justificatif ({width}px): {url}");
    }
}

pub struct TerminalAlerts;

impl AlertSurface for TerminalAlerts {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

pub fn render_bills(bills: &[DisplayBill]) -> String {
    let mut out = String::from("Mes notes de frais\n");
    for (index, bill) in bills.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<22} {:<14} {:<24} {:>6} €  {}",
            index + 1,
            bill.bill.expense_type.as_deref().unwrap_or("-"),
            bill.date(),
            bill.bill.name.as_deref().unwrap_or("-"),
            bill.bill
                .amount
                .map_or_else(|| "-".to_string(), |amount| amount.to_string()),
            bill.status(),
        );
    }
    out
}

/// Error line shown in place of the bills table.
pub fn describe_retrieve_error(err: &RetrieveError) -> String {
    let expired = matches!(
        err,
        RetrieveError::Store(store) if store.code().is_some_and(|code| code.is_auth())
    );
    if expired {
        format!("Erreur : {err} (session expirée, reconnectez-vous)")
    } else {
        format!("Erreur : {err}")
    }
}
