// src/handlers/inventory.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::inventory::{
        AjusteEstoquePayload, AtualizarProduto, MovimentacaoEstoque, NovoProduto, Produto, ProdutosQuery,
    },
};

// GET /api/produtos
#[utoipa::path(
    get,
    path = "/api/produtos",
    tag = "Inventory",
    params(ProdutosQuery),
    responses(
        (status = 200, description = "Produtos da conta", body = Vec<Produto>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_produtos(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Query(query): Query<ProdutosQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let produtos = app_state
        .inventory_service
        .listar(&usuario.email, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(produtos)))
}

// POST /api/produtos
#[utoipa::path(
    post,
    path = "/api/produtos",
    tag = "Inventory",
    request_body = NovoProduto,
    responses(
        (status = 201, description = "Produto cadastrado (estoque inicial vira uma entrada)", body = Produto),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<NovoProduto>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .inventory_service
        .criar(&usuario.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(produto)))
}

// PUT /api/produtos/{id}
#[utoipa::path(
    put,
    path = "/api/produtos/{id}",
    tag = "Inventory",
    request_body = AtualizarProduto,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Produto),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarProduto>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .inventory_service
        .atualizar(&usuario.email, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(produto)))
}

// POST /api/produtos/{id}/ajuste
#[utoipa::path(
    post,
    path = "/api/produtos/{id}/ajuste",
    tag = "Inventory",
    request_body = AjusteEstoquePayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Estoque ajustado", body = Produto),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn ajustar_estoque(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AjusteEstoquePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .inventory_service
        .ajustar(&usuario.email, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(produto)))
}

// GET /api/produtos/{id}/movimentacoes
#[utoipa::path(
    get,
    path = "/api/produtos/{id}/movimentacoes",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Movimentações, da mais recente à mais antiga", body = Vec<MovimentacaoEstoque>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movimentacoes(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movimentacoes = app_state
        .inventory_service
        .movimentacoes(&usuario.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movimentacoes)))
}

// GET /api/produtos/estoque-baixo
#[utoipa::path(
    get,
    path = "/api/produtos/estoque-baixo",
    tag = "Inventory",
    responses(
        (status = 200, description = "Produtos ativos no estoque mínimo ou abaixo", body = Vec<Produto>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_estoque_baixo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let produtos = app_state
        .inventory_service
        .estoque_baixo(&usuario.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(produtos)))
}
