// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::{Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormaPagamento {
    AVista,
    Pix,
    CartaoCredito,
    CartaoDebito,
    Crediario,
}

impl FormaPagamento {
    /// Só a venda à vista nasce quitada.
    pub fn status_inicial(&self) -> VendaStatus {
        match self {
            FormaPagamento::AVista => VendaStatus::Pago,
            _ => VendaStatus::Pendente,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormaPagamento::AVista => "À vista",
            FormaPagamento::Pix => "PIX",
            FormaPagamento::CartaoCredito => "Cartão de crédito",
            FormaPagamento::CartaoDebito => "Cartão de débito",
            FormaPagamento::Crediario => "Crediário",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VendaStatus {
    Pago,
    Pendente,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemVenda {
    pub produto_id: Uuid,
    pub produto_nome: String,
    pub quantidade: i64,
    pub preco_unitario: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Venda {
    pub id: Uuid,
    pub numero_venda: i64,
    pub cliente_id: Uuid,
    pub cliente_nome: String,
    #[serde(default)]
    pub cliente_telefone: Option<String>,
    pub itens: Vec<ItemVenda>,
    pub valor_total: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub status: VendaStatus,
    #[serde(default)]
    pub quantidade_parcelas: Option<u32>,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub data_venda: NaiveDate,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Venda {
    const KIND: EntityKind = EntityKind::Venda;
}

/// Venda validada, pronta para ser gravada.
/// Só é construída por `SaleDraft::validate`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NovaVenda {
    pub cliente_id: Uuid,
    pub cliente_nome: String,
    pub cliente_telefone: Option<String>,
    pub itens: Vec<ItemVenda>,
    pub valor_total: Decimal,
    pub forma_pagamento: FormaPagamento,
    /// `None` a menos que a forma seja crediário
    pub quantidade_parcelas: Option<u32>,
    pub observacoes: Option<String>,
    pub data_venda: NaiveDate,
}

// O registro gravado: a venda validada mais o número e o status.
#[derive(Debug, Serialize)]
pub struct VendaRegistro<'a> {
    #[serde(flatten)]
    pub venda: &'a NovaVenda,
    pub numero_venda: i64,
    pub status: VendaStatus,
}

// ---
// Payloads
// ---
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ItemCarrinhoPayload {
    pub produto_id: Option<Uuid>,
    /// Alternativa ao `produto_id`: leitura do código de barras
    pub codigo_barras: Option<String>,
    pub quantidade: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegistrarVendaPayload {
    pub cliente_id: Option<Uuid>,
    #[serde(default)]
    pub itens: Vec<ItemCarrinhoPayload>,
    pub forma_pagamento: FormaPagamento,
    pub quantidade_parcelas: Option<u32>,
    pub observacoes: Option<String>,
    /// Padrão: hoje
    pub data_venda: Option<NaiveDate>,
}

/// Prévia do carrinho devolvida por `POST /api/vendas/carrinho`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CarrinhoResumo {
    pub itens: Vec<LinhaCarrinho>,
    pub valor_total: Decimal,
    pub quantidade_itens: i64,
    /// Prévia do plano quando a forma é crediário
    pub parcelas: Vec<crate::models::billing::NovaParcela>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LinhaCarrinho {
    pub produto_id: Uuid,
    pub produto_nome: String,
    pub quantidade: i64,
    pub preco_unitario: Decimal,
    pub subtotal: Decimal,
    pub estoque_disponivel: i64,
}

/// Resultado do registro de uma venda.
#[derive(Debug, Serialize, ToSchema)]
pub struct VendaRegistrada {
    pub venda: Venda,
    pub parcelas: usize,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VendasQuery {
    pub cliente_id: Option<Uuid>,
    /// Busca pelo nome do cliente
    pub busca: Option<String>,
    pub limite: Option<i64>,
}
