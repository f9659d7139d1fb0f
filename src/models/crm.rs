// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{Entity, EntityKind},
    models::{billing::Cobranca, sales::Venda},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClienteStatus {
    #[default]
    Ativo,
    Inativo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cliente {
    pub id: Uuid,
    pub nome_completo: String,
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub limite_credito: Decimal,
    #[serde(default)]
    pub status: ClienteStatus,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Cliente {
    const KIND: EntityKind = EntityKind::Cliente;
}

// Payload de criação. Também é o formato das linhas importadas.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NovoCliente {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome_completo: String,
    pub cpf_cnpj: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(equal = 2, message = "Use a sigla do estado (ex: SP)."))]
    pub estado: Option<String>,
    pub cep: Option<String>,
    #[serde(default)]
    pub limite_credito: Decimal,
    #[serde(default)]
    pub status: ClienteStatus,
    pub observacoes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AtualizarCliente {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome_completo: Option<String>,
    pub cpf_cnpj: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
    pub limite_credito: Option<Decimal>,
    pub status: Option<ClienteStatus>,
    pub observacoes: Option<String>,
}

/// Ficha do cliente: compras e parcelas.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClienteHistorico {
    pub cliente: Cliente,
    pub vendas: Vec<Venda>,
    pub parcelas: Vec<Cobranca>,
    pub total_comprado: Decimal,
    pub total_em_aberto: Decimal,
}
