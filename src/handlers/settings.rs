// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::settings::{AtualizarConfiguracao, Configuracao},
};

// GET /api/configuracoes
#[utoipa::path(
    get,
    path = "/api/configuracoes",
    tag = "Configurações",
    responses(
        (status = 200, description = "Dados da empresa (null enquanto não configurados)", body = Option<Configuracao>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .settings_service
        .obter(&usuario.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/configuracoes
#[utoipa::path(
    put,
    path = "/api/configuracoes",
    tag = "Configurações",
    request_body = AtualizarConfiguracao,
    responses(
        (status = 200, description = "Configurações salvas", body = Configuracao),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<AtualizarConfiguracao>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .settings_service
        .salvar(&usuario.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}
