// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::crm::{AtualizarCliente, Cliente, ClienteHistorico, NovoCliente},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClientesQuery {
    /// Procura no nome, CPF/CNPJ e e-mail
    pub busca: Option<String>,
}

// GET /api/clientes
#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Clientes",
    params(ClientesQuery),
    responses(
        (status = 200, description = "Clientes da conta em ordem alfabética", body = Vec<Cliente>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clientes(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Query(query): Query<ClientesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let clientes = app_state
        .crm_service
        .listar(&usuario.email, query.busca.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clientes)))
}

// POST /api/clientes
#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = NovoCliente,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Cliente),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cliente(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<NovoCliente>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cliente = app_state
        .crm_service
        .criar(&usuario.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cliente)))
}

// GET /api/clientes/{id}
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Cliente),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cliente(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cliente = app_state
        .crm_service
        .obter(&usuario.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cliente)))
}

// PUT /api/clientes/{id}
#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    request_body = AtualizarCliente,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Cliente),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_cliente(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarCliente>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cliente = app_state
        .crm_service
        .atualizar(&usuario.email, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cliente)))
}

// GET /api/clientes/{id}/historico
#[utoipa::path(
    get,
    path = "/api/clientes/{id}/historico",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Compras e parcelas do cliente", body = ClienteHistorico),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_historico(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let historico = app_state
        .crm_service
        .historico(&usuario.email, id, hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(historico)))
}
