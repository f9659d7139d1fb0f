// src/handlers/billing.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::billing::{
        Cobranca, CobrancasQuery, LembreteWhatsApp, PagarParcelaPayload, PaginaCobrancas,
        ResumoCobrancas,
    },
};

// GET /api/cobrancas
#[utoipa::path(
    get,
    path = "/api/cobrancas",
    tag = "Cobranças",
    params(CobrancasQuery),
    responses(
        (status = 200, description = "Página de parcelas com status derivado (atrasado, pendente, pago)", body = PaginaCobrancas),
        (status = 400, description = "Página fora do intervalo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_cobrancas(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Query(query): Query<CobrancasQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let pagina = app_state
        .billing_service
        .listar(&usuario.email, &query, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pagina)))
}

// GET /api/cobrancas/resumo
#[utoipa::path(
    get,
    path = "/api/cobrancas/resumo",
    tag = "Cobranças",
    responses(
        (status = 200, description = "Totais de atrasadas, vencendo hoje e pendentes", body = ResumoCobrancas)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_resumo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let resumo = app_state
        .billing_service
        .resumo(&usuario.email, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resumo)))
}

// POST /api/cobrancas/{id}/pagar
#[utoipa::path(
    post,
    path = "/api/cobrancas/{id}/pagar",
    tag = "Cobranças",
    request_body = PagarParcelaPayload,
    params(("id" = Uuid, Path, description = "ID da parcela")),
    responses(
        (status = 200, description = "Pagamento registrado", body = Cobranca),
        (status = 400, description = "Parcela já paga"),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn pagar_parcela(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<PagarParcelaPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    // Corpo opcional: sem corpo, a data de pagamento é hoje
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let cobranca = app_state
        .billing_service
        .pagar(&usuario.email, id, payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cobranca)))
}

// GET /api/cobrancas/{id}/lembrete
#[utoipa::path(
    get,
    path = "/api/cobrancas/{id}/lembrete",
    tag = "Cobranças",
    params(("id" = Uuid, Path, description = "ID da parcela")),
    responses(
        (status = 200, description = "Mensagem de cobrança e link do WhatsApp", body = LembreteWhatsApp),
        (status = 400, description = "Cliente sem telefone")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lembrete(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lembrete = app_state
        .billing_service
        .lembrete(&usuario.email, id, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lembrete)))
}
