// src/models.rs

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
