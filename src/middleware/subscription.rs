// src/middleware/subscription.rs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Local;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Usuario,
};

// Roda depois do auth_guard: as rotas de negócio exigem a mensalidade em dia.
pub async fn subscription_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let usuario = request
        .extensions()
        .get::<Usuario>()
        .cloned()
        .ok_or(AppError::InvalidToken)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let em_dia = app_state
        .subscription_service
        .em_dia(&usuario, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !em_dia {
        tracing::info!("💳 {} bloqueado: mensalidade pendente", usuario.email);
        return Err(AppError::SubscriptionOverdue.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(next.run(request).await)
}
