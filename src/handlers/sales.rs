// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::sales::{CarrinhoResumo, RegistrarVendaPayload, Venda, VendaRegistrada, VendasQuery},
};

// GET /api/vendas
#[utoipa::path(
    get,
    path = "/api/vendas",
    tag = "Vendas",
    params(VendasQuery),
    responses(
        (status = 200, description = "Vendas da conta, mais recentes primeiro", body = Vec<Venda>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_vendas(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Query(query): Query<VendasQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let vendas = app_state
        .sale_service
        .listar(&usuario.email, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vendas)))
}

// GET /api/vendas/{id}
#[utoipa::path(
    get,
    path = "/api/vendas/{id}",
    tag = "Vendas",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda", body = Venda),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_venda(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let venda = app_state
        .sale_service
        .obter(&usuario.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(venda)))
}

// POST /api/vendas
// A validação do carrinho acontece no serviço, antes de qualquer gravação.
#[utoipa::path(
    post,
    path = "/api/vendas",
    tag = "Vendas",
    request_body = RegistrarVendaPayload,
    responses(
        (status = 201, description = "Venda registrada, parcelas geradas e estoque baixado", body = VendaRegistrada),
        (status = 400, description = "Carrinho inválido"),
        (status = 500, description = "Falha parcial: detalhes listam os passos já gravados")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_venda(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<RegistrarVendaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let registrada = app_state
        .sale_service
        .registrar(&usuario.email, payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(registrada)))
}

// POST /api/vendas/carrinho
#[utoipa::path(
    post,
    path = "/api/vendas/carrinho",
    tag = "Vendas",
    request_body = RegistrarVendaPayload,
    responses(
        (status = 200, description = "Prévia do carrinho com totais e plano de parcelas", body = CarrinhoResumo),
        (status = 404, description = "Produto ou cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_carrinho(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<RegistrarVendaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let resumo = app_state
        .sale_service
        .preview(&usuario.email, &payload, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resumo)))
}
