// src/handlers/support.rs

use axum::{
    extract::{Path, State},
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
    models::support::{
        AbrirConversaPayload, AbrirTicketPayload, ChatMessage, ConversaAberta, EnviarMensagemPayload,
        SuporteTicket,
    },
};

// POST /api/suporte/conversas
#[utoipa::path(
    post,
    path = "/api/suporte/conversas",
    tag = "Suporte",
    request_body = AbrirConversaPayload,
    responses(
        (status = 201, description = "Conversa aberta com a primeira mensagem", body = ConversaAberta),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn abrir_conversa(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<AbrirConversaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let aberta = app_state
        .support_service
        .abrir_conversa(&usuario, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(aberta)))
}

// GET /api/suporte/conversas/{id}/mensagens
#[utoipa::path(
    get,
    path = "/api/suporte/conversas/{id}/mensagens",
    tag = "Suporte",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Mensagens, da mais antiga à mais nova", body = Vec<ChatMessage>),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mensagens(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mensagens = app_state
        .support_service
        .mensagens(&usuario, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mensagens)))
}

// POST /api/suporte/conversas/{id}/mensagens
#[utoipa::path(
    post,
    path = "/api/suporte/conversas/{id}/mensagens",
    tag = "Suporte",
    request_body = EnviarMensagemPayload,
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 201, description = "Mensagem enviada", body = ChatMessage),
        (status = 400, description = "Conversa encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn enviar_mensagem(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnviarMensagemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mensagem = app_state
        .support_service
        .enviar_mensagem(&usuario, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(mensagem)))
}

// POST /api/suporte/tickets
#[utoipa::path(
    post,
    path = "/api/suporte/tickets",
    tag = "Suporte",
    request_body = AbrirTicketPayload,
    responses(
        (status = 201, description = "Ticket aberto", body = SuporteTicket),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn abrir_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(usuario): AuthenticatedUser,
    Json(payload): Json<AbrirTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .support_service
        .abrir_ticket(&usuario, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}
