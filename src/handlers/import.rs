// src/handlers/import.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::import::{ImportacaoPayload, ImportacaoResultado},
};

// POST /api/import/{entity}
#[utoipa::path(
    post,
    path = "/api/import/{entity}",
    tag = "Importação",
    request_body = ImportacaoPayload,
    params(("entity" = String, Path, description = "Cliente | Produto")),
    responses(
        (status = 201, description = "Registros importados", body = ImportacaoResultado),
        (status = 400, description = "Entidade não importável, extração com falha ou linha inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn importar(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(entity): Path<String>,
    Json(payload): Json<ImportacaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let resultado = app_state
        .import_service
        .importar(&usuario.email, &entity, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(resultado)))
}
