// src/handlers.rs

use chrono::{Local, NaiveDate};

pub mod admin;
pub mod auth;
pub mod billing;
pub mod crm;
pub mod dashboard;
pub mod documents;
pub mod import;
pub mod inventory;
pub mod sales;
pub mod settings;
pub mod subscription;
pub mod support;

/// Data de referência das regras de vencimento (fuso do servidor).
pub(crate) fn hoje() -> NaiveDate {
    Local::now().date_naive()
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}
