// src/handlers/dashboard.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::hoje,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::dashboard::{DashboardResumo, Relatorio, TipoRelatorio, TopProduto, VendasMes},
};

// GET /api/dashboard/resumo
#[utoipa::path(
    get,
    path = "/api/dashboard/resumo",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cards do topo: clientes, vendas, a receber e produtos", body = DashboardResumo),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_resumo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let resumo = app_state
        .dashboard_service
        .resumo(&usuario.email, hoje())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resumo)))
}

// GET /api/dashboard/vendas-mensais
#[utoipa::path(
    get,
    path = "/api/dashboard/vendas-mensais",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Vendas dos últimos 6 meses", body = Vec<VendasMes>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vendas_mensais(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let chart = app_state
        .dashboard_service
        .vendas_mensais(&usuario.email, hoje())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(chart)))
}

// GET /api/dashboard/top-produtos
#[utoipa::path(
    get,
    path = "/api/dashboard/top-produtos",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Os 5 produtos mais vendidos por quantidade", body = Vec<TopProduto>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_top_produtos(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .dashboard_service
        .top_produtos(&usuario.email)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/relatorios/{tipo}
#[utoipa::path(
    get,
    path = "/api/relatorios/{tipo}",
    tag = "Relatórios",
    params(("tipo" = String, Path, description = "vendas_mes | clientes_ativos | produtos | parcelas_atrasadas")),
    responses(
        (status = 200, description = "Relatório gerado", body = Relatorio),
        (status = 400, description = "Tipo de relatório inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_relatorio(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(tipo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tipo: TipoRelatorio = tipo
        .parse()
        .map_err(|e: AppError| e.to_api_error(&locale, &app_state.i18n_store))?;

    let relatorio = app_state
        .dashboard_service
        .relatorio(&usuario.email, tipo, hoje())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(relatorio)))
}
