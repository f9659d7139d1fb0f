// src/models/subscription.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{Entity, EntityKind},
    models::auth::UserStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PagamentoStatus {
    AguardandoVerificacao,
    Aprovado,
    Recusado,
}

impl PagamentoStatus {
    /// Conta para "em dia" enquanto não for recusado.
    pub fn conta_como_em_dia(&self) -> bool {
        matches!(self, PagamentoStatus::Aprovado | PagamentoStatus::AguardandoVerificacao)
    }
}

/// Comprovante de mensalidade enviado por uma empresa (usuário).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagamento {
    pub id: Uuid,
    pub empresa_id: Uuid,
    pub empresa_nome: String,
    /// `MM/YYYY`
    pub mes_referencia: String,
    pub valor: Decimal,
    pub comprovante_url: String,
    pub status: PagamentoStatus,
    #[serde(default)]
    pub observacoes: Option<String>,
    #[serde(default)]
    pub verificado_por: Option<String>,
    #[serde(default)]
    pub data_verificacao: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Pagamento {
    const KIND: EntityKind = EntityKind::Pagamento;
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EnviarComprovantePayload {
    #[validate(url(message = "Informe o link do comprovante."))]
    pub comprovante_url: String,
    /// Padrão: `VALOR_MENSALIDADE` das configurações públicas
    pub valor: Option<Decimal>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NovoPagamento {
    pub empresa_id: Uuid,
    pub empresa_nome: String,
    pub mes_referencia: String,
    pub valor: Decimal,
    pub comprovante_url: String,
    pub status: PagamentoStatus,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisaoRevisao {
    Aprovado,
    Recusado,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RevisarPagamentoPayload {
    pub decisao: DecisaoRevisao,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RevisaoPagamento {
    pub status: PagamentoStatus,
    pub observacoes: Option<String>,
    pub verificado_por: String,
    pub data_verificacao: DateTime<Utc>,
}

/// Situação da mensalidade do usuário logado.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMensalidade {
    pub em_dia: bool,
    pub mes_referencia: String,
    pub pagamento_atual: Option<Pagamento>,
    pub valor_mensalidade: Option<Decimal>,
    pub chave_pix: Option<String>,
    pub nome_banco_pix: Option<String>,
    pub nome_titular_pix: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Inadimplente {
    pub usuario_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub status: UserStatus,
    pub ultimo_pagamento: Option<String>,
}
