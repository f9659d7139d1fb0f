// src/models/support.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::{Entity, EntityKind};

// --- Chat ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversaStatus {
    Aberta,
    Fechada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Remetente {
    Usuario,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatConversa {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub usuario_email: String,
    pub usuario_nome: String,
    pub assunto: String,
    pub status: ConversaStatus,
    #[serde(default)]
    pub ultima_mensagem: Option<String>,
    #[serde(default)]
    pub data_ultima_mensagem: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for ChatConversa {
    const KIND: EntityKind = EntityKind::ChatConversa;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversa_id: Uuid,
    pub remetente: Remetente,
    pub remetente_email: String,
    pub conteudo: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for ChatMessage {
    const KIND: EntityKind = EntityKind::ChatMessage;
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AbrirConversaPayload {
    #[validate(length(min = 1, max = 200, message = "Informe o assunto."))]
    pub assunto: String,
    #[validate(length(min = 1, message = "A mensagem não pode ser vazia."))]
    pub mensagem: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EnviarMensagemPayload {
    #[validate(length(min = 1, message = "A mensagem não pode ser vazia."))]
    pub conteudo: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NovaConversa {
    pub usuario_id: Uuid,
    pub usuario_email: String,
    pub usuario_nome: String,
    pub assunto: String,
    pub status: ConversaStatus,
    pub ultima_mensagem: String,
    pub data_ultima_mensagem: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NovaMensagem {
    pub conversa_id: Uuid,
    pub remetente: Remetente,
    pub remetente_email: String,
    pub conteudo: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversaAberta {
    pub conversa: ChatConversa,
    pub mensagem: ChatMessage,
}

// --- Tickets ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Prioridade {
    Baixa,
    #[default]
    Media,
    Alta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Aberto,
    Resolvido,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuporteTicket {
    pub id: Uuid,
    pub usuario_email: String,
    pub assunto: String,
    pub descricao: String,
    pub prioridade: Prioridade,
    pub status: TicketStatus,
    #[serde(default)]
    pub resposta: Option<String>,
    #[serde(default)]
    pub data_resolucao: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for SuporteTicket {
    const KIND: EntityKind = EntityKind::SuporteTicket;
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AbrirTicketPayload {
    #[validate(length(min = 1, max = 200, message = "Informe o assunto."))]
    pub assunto: String,
    #[validate(length(min = 1, message = "Descreva o problema."))]
    pub descricao: String,
    #[serde(default)]
    pub prioridade: Prioridade,
}

#[derive(Debug, Serialize)]
pub(crate) struct NovoTicket {
    pub usuario_email: String,
    pub assunto: String,
    pub descricao: String,
    pub prioridade: Prioridade,
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolverTicketPayload {
    #[validate(length(min = 1, message = "A resposta é obrigatória."))]
    pub resposta: String,
}
