// src/models/documents.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemNota {
    pub descricao: String,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
}

// Notas e recibos não têm update: depois de emitidos, são imutáveis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotaServico {
    pub id: Uuid,
    pub numero_nota: String,
    #[serde(default)]
    pub venda_id: Option<Uuid>,
    #[serde(default)]
    pub cliente_id: Option<Uuid>,
    pub cliente_nome: String,
    #[serde(default)]
    pub cliente_cpf_cnpj: Option<String>,
    #[serde(default)]
    pub cliente_endereco: Option<String>,
    pub data_emissao: NaiveDate,
    pub itens: Vec<ItemNota>,
    pub valor_total: Decimal,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for NotaServico {
    const KIND: EntityKind = EntityKind::NotaServico;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Recibo {
    pub id: Uuid,
    pub numero_recibo: String,
    #[serde(default)]
    pub venda_id: Option<Uuid>,
    #[serde(default)]
    pub parcela_id: Option<Uuid>,
    #[serde(default)]
    pub cliente_id: Option<Uuid>,
    pub cliente_nome: String,
    #[serde(default)]
    pub cliente_cpf_cnpj: Option<String>,
    pub data_pagamento: NaiveDate,
    pub valor_pago: Decimal,
    pub forma_pagamento: String,
    pub referente_a: String,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Recibo {
    const KIND: EntityKind = EntityKind::Recibo;
}

// ---
// Payloads
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ItemNotaPayload {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
}

/// Emissão de nota a partir de uma venda.
/// Sem `itens`, a nota copia os itens da venda.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EmitirNotaPayload {
    pub venda_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub itens: Vec<ItemNotaPayload>,
    pub observacoes: Option<String>,
}

/// Emissão de recibo de uma parcela paga.
/// Valor e data vêm da parcela quando não informados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EmitirReciboPayload {
    pub parcela_id: Option<Uuid>,
    pub valor_pago: Option<Decimal>,
    pub data_pagamento: Option<NaiveDate>,
    /// Padrão: "Dinheiro"
    pub forma_pagamento: Option<String>,
    #[validate(length(min = 1, message = "Informe a que se refere o pagamento."))]
    pub referente_a: Option<String>,
    pub observacoes: Option<String>,
}

// Gravados no entity store
#[derive(Debug, Serialize)]
pub(crate) struct NovaNota {
    pub numero_nota: String,
    pub venda_id: Option<Uuid>,
    pub cliente_id: Option<Uuid>,
    pub cliente_nome: String,
    pub cliente_cpf_cnpj: Option<String>,
    pub cliente_endereco: Option<String>,
    pub data_emissao: NaiveDate,
    pub itens: Vec<ItemNota>,
    pub valor_total: Decimal,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NovoRecibo {
    pub numero_recibo: String,
    pub venda_id: Option<Uuid>,
    pub parcela_id: Option<Uuid>,
    pub cliente_id: Option<Uuid>,
    pub cliente_nome: String,
    pub cliente_cpf_cnpj: Option<String>,
    pub data_pagamento: NaiveDate,
    pub valor_pago: Decimal,
    pub forma_pagamento: String,
    pub referente_a: String,
    pub observacoes: Option<String>,
}
