// src/services.rs

pub mod auth;
pub mod billing_service;
pub mod cart;
pub mod crm_service;
pub mod dashboard_service;
pub mod document_service;
pub mod import_service;
pub mod installment_plan;
pub mod inventory_service;
pub mod sale_service;
pub mod settings_service;
pub mod subscription_service;
pub mod support_service;
