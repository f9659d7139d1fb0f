// src/handlers/admin.rs

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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAdmin, RequirePermission},
    },
    models::{
        auth::{AdminUpdateUserPayload, UserProfile},
        dashboard::{AdminDashboard, UsuarioDetalhes},
        settings::{ConfiguracaoPublica, DefinirConfiguracaoPublica},
        subscription::{Inadimplente, Pagamento, PagamentoStatus, RevisarPagamentoPayload},
        support::{ChatConversa, ResolverTicketPayload, SuporteTicket},
    },
};

// Todas as rotas daqui exigem o papel de admin (RequirePermission<PermAdmin>).

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PagamentosQuery {
    pub status: Option<PagamentoStatus>,
}

// =============================================================================
//  PAINEL
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    responses(
        (status = 200, description = "Indicadores da plataforma", body = AdminDashboard),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let painel = app_state
        .dashboard_service
        .admin(hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(painel)))
}

#[utoipa::path(
    get,
    path = "/api/admin/inadimplentes",
    tag = "Admin",
    responses(
        (status = 200, description = "Usuários sem comprovante válido no mês", body = Vec<Inadimplente>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_inadimplentes(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let inadimplentes = app_state
        .subscription_service
        .inadimplentes(hoje())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(inadimplentes)))
}

// =============================================================================
//  MENSALIDADES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/pagamentos",
    tag = "Admin",
    params(PagamentosQuery),
    responses(
        (status = 200, description = "Comprovantes de mensalidade", body = Vec<Pagamento>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pagamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    Query(query): Query<PagamentosQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagamentos = app_state
        .subscription_service
        .todos_pagamentos(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pagamentos)))
}

#[utoipa::path(
    post,
    path = "/api/admin/pagamentos/{id}/revisar",
    tag = "Admin",
    request_body = RevisarPagamentoPayload,
    params(("id" = Uuid, Path, description = "ID do pagamento")),
    responses(
        (status = 200, description = "Pagamento aprovado ou recusado", body = Pagamento),
        (status = 400, description = "Pagamento já revisado")
    ),
    security(("api_jwt" = []))
)]
pub async fn revisar_pagamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RevisarPagamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pagamento = app_state
        .subscription_service
        .revisar(&admin, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pagamento)))
}

// =============================================================================
//  SUPORTE
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/conversas",
    tag = "Admin",
    responses(
        (status = 200, description = "Conversas abertas, mais recentes primeiro", body = Vec<ChatConversa>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_conversas(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let conversas = app_state
        .support_service
        .conversas_abertas()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(conversas)))
}

#[utoipa::path(
    post,
    path = "/api/admin/conversas/{id}/fechar",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Conversa encerrada", body = ChatConversa)
    ),
    security(("api_jwt" = []))
)]
pub async fn fechar_conversa(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conversa = app_state
        .support_service
        .fechar_conversa(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(conversa)))
}

#[utoipa::path(
    get,
    path = "/api/admin/tickets",
    tag = "Admin",
    responses(
        (status = 200, description = "Tickets em aberto, mais antigos primeiro", body = Vec<SuporteTicket>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = app_state
        .support_service
        .tickets_abertos()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tickets)))
}

#[utoipa::path(
    post,
    path = "/api/admin/tickets/{id}/resolver",
    tag = "Admin",
    request_body = ResolverTicketPayload,
    params(("id" = Uuid, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Ticket resolvido", body = SuporteTicket),
        (status = 400, description = "Ticket já resolvido")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolver_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolverTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .support_service
        .resolver_ticket(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// =============================================================================
//  USUÁRIOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/usuarios",
    tag = "Admin",
    responses(
        (status = 200, description = "Todos os usuários da plataforma", body = Vec<UserProfile>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_usuarios(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let usuarios: Vec<UserProfile> = app_state
        .auth_service
        .listar_usuarios()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok((StatusCode::OK, Json(usuarios)))
}

#[utoipa::path(
    get,
    path = "/api/admin/usuarios/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Conta com clientes, vendas e mensalidades", body = UsuarioDetalhes),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_usuario(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detalhes = app_state
        .dashboard_service
        .detalhes_usuario(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detalhes)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/usuarios/{id}",
    tag = "Admin",
    request_body = AdminUpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Papel ou status alterado", body = UserProfile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_usuario(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = app_state
        .auth_service
        .admin_update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(UserProfile::from(usuario))))
}

// =============================================================================
//  CONFIGURAÇÕES DA PLATAFORMA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/configuracoes-publicas",
    tag = "Admin",
    responses(
        (status = 200, description = "Chave PIX, valor da mensalidade etc.", body = Vec<ConfiguracaoPublica>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_configuracoes_publicas(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let configuracoes = app_state
        .settings_service
        .listar_publicas()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(configuracoes)))
}

#[utoipa::path(
    put,
    path = "/api/admin/configuracoes-publicas",
    tag = "Admin",
    request_body = DefinirConfiguracaoPublica,
    responses(
        (status = 200, description = "Configuração gravada", body = ConfiguracaoPublica),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn definir_configuracao_publica(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermAdmin>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Json(payload): Json<DefinirConfiguracaoPublica>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let configuracao = app_state
        .settings_service
        .definir_publica(&admin.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(configuracao)))
}
