// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::documents::{EmitirNotaPayload, EmitirReciboPayload, NotaServico, Recibo},
};

fn pdf_response(filename: String, pdf_bytes: Vec<u8>) -> Response {
    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let disposition = format!("attachment; filename=\"{}\"", filename);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    (headers, pdf_bytes).into_response()
}

// =============================================================================
//  NOTAS DE SERVIÇO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/documentos/notas",
    tag = "Documentos",
    responses(
        (status = 200, description = "Notas emitidas, mais recentes primeiro", body = Vec<NotaServico>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notas(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let notas = app_state
        .document_service
        .listar_notas(&usuario.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notas)))
}

#[utoipa::path(
    post,
    path = "/api/documentos/notas",
    tag = "Documentos",
    request_body = EmitirNotaPayload,
    responses(
        (status = 201, description = "Nota de serviço emitida", body = NotaServico),
        (status = 400, description = "Venda não informada ou nota sem itens")
    ),
    security(("api_jwt" = []))
)]
pub async fn emitir_nota(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<EmitirNotaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let nota = app_state
        .document_service
        .emitir_nota(&usuario.email, payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(nota)))
}

#[utoipa::path(
    get,
    path = "/api/documentos/notas/{id}/pdf",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "PDF da nota", content_type = "application/pdf"),
        (status = 404, description = "Nota não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn pdf_nota(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .pdf_nota(&usuario.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(format!("nota_{}.pdf", id), pdf_bytes))
}

// =============================================================================
//  RECIBOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/documentos/recibos",
    tag = "Documentos",
    responses(
        (status = 200, description = "Recibos emitidos, mais recentes primeiro", body = Vec<Recibo>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_recibos(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let recibos = app_state
        .document_service
        .listar_recibos(&usuario.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(recibos)))
}

#[utoipa::path(
    post,
    path = "/api/documentos/recibos",
    tag = "Documentos",
    request_body = EmitirReciboPayload,
    responses(
        (status = 201, description = "Recibo emitido", body = Recibo),
        (status = 400, description = "Parcela não informada ou ainda não paga")
    ),
    security(("api_jwt" = []))
)]
pub async fn emitir_recibo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<EmitirReciboPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let recibo = app_state
        .document_service
        .emitir_recibo(&usuario.email, payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(recibo)))
}

#[utoipa::path(
    get,
    path = "/api/documentos/recibos/{id}/pdf",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do recibo")),
    responses(
        (status = 200, description = "PDF do recibo", content_type = "application/pdf"),
        (status = 404, description = "Recibo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn pdf_recibo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .pdf_recibo(&usuario.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(format!("recibo_{}.pdf", id), pdf_bytes))
}
