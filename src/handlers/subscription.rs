// src/handlers/subscription.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::subscription::{EnviarComprovantePayload, Pagamento, StatusMensalidade},
};

// Rotas da mensalidade ficam fora do bloqueio por inadimplência:
// é por aqui que o usuário regulariza a conta.

#[utoipa::path(
    get,
    path = "/api/mensalidade",
    tag = "Mensalidade",
    responses(
        (status = 200, description = "Comprovantes enviados pelo usuário", body = Vec<Pagamento>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pagamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let pagamentos = app_state
        .subscription_service
        .meus_pagamentos(&usuario)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pagamentos)))
}

#[utoipa::path(
    post,
    path = "/api/mensalidade",
    tag = "Mensalidade",
    request_body = EnviarComprovantePayload,
    responses(
        (status = 201, description = "Comprovante enviado para verificação", body = Pagamento),
        (status = 400, description = "Já existe comprovante válido para o mês")
    ),
    security(("api_jwt" = []))
)]
pub async fn enviar_comprovante(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<EnviarComprovantePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let pagamento = app_state
        .subscription_service
        .enviar_comprovante(&usuario, payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(pagamento)))
}

#[utoipa::path(
    get,
    path = "/api/mensalidade/status",
    tag = "Mensalidade",
    responses(
        (status = 200, description = "Situação do mês corrente e dados do PIX", body = StatusMensalidade)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .subscription_service
        .status(&usuario, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(status)))
}
