// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::{Entity, EntityKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProdutoStatus {
    #[default]
    Ativo,
    Inativo,
}

// --- Produtos ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Produto {
    pub id: Uuid,
    pub nome_produto: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub codigo_barras: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default = "default_unidade")]
    pub unidade: String,
    pub preco_venda: Decimal,
    #[serde(default)]
    pub preco_custo: Option<Decimal>,
    // Pode ficar negativo: a baixa de estoque não reconfere o saldo
    #[serde(default)]
    pub quantidade_estoque: i64,
    #[serde(default)]
    pub estoque_minimo: i64,
    #[serde(default)]
    pub status: ProdutoStatus,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Produto {
    const KIND: EntityKind = EntityKind::Produto;
}

impl Produto {
    pub fn estoque_baixo(&self) -> bool {
        self.quantidade_estoque <= self.estoque_minimo
    }
}

fn default_unidade() -> String {
    "un".to_string()
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// Payload de criação. Também é o formato das linhas importadas.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NovoProduto {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome_produto: String,
    pub descricao: Option<String>,
    pub sku: Option<String>,
    pub codigo_barras: Option<String>,
    pub categoria: Option<String>,
    #[serde(default = "default_unidade")]
    pub unidade: String,
    #[validate(custom(function = "validate_not_negative"))]
    pub preco_venda: Decimal,
    pub preco_custo: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque inicial não pode ser negativo."))]
    pub quantidade_estoque: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub estoque_minimo: i64,
    #[serde(default)]
    pub status: ProdutoStatus,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AtualizarProduto {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome_produto: Option<String>,
    pub descricao: Option<String>,
    pub sku: Option<String>,
    pub codigo_barras: Option<String>,
    pub categoria: Option<String>,
    pub unidade: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub preco_venda: Option<Decimal>,
    pub preco_custo: Option<Decimal>,
    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub estoque_minimo: Option<i64>,
    pub status: Option<ProdutoStatus>,
}

// --- Movimentações de estoque ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoMovimentacao {
    Entrada,
    Saida,
    /// Define o saldo absoluto (inventário)
    Ajuste,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovimentacaoEstoque {
    pub id: Uuid,
    pub produto_id: Uuid,
    pub tipo: TipoMovimentacao,
    pub quantidade: i64,
    pub saldo_anterior: i64,
    pub saldo_atual: i64,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default)]
    pub venda_id: Option<Uuid>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for MovimentacaoEstoque {
    const KIND: EntityKind = EntityKind::MovimentacaoEstoque;
}

#[derive(Debug, Serialize)]
pub struct NovaMovimentacao {
    pub produto_id: Uuid,
    pub tipo: TipoMovimentacao,
    pub quantidade: i64,
    pub saldo_anterior: i64,
    pub saldo_atual: i64,
    pub motivo: Option<String>,
    pub venda_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AjusteEstoquePayload {
    pub tipo: TipoMovimentacao,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantidade: i64,
    pub motivo: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProdutosQuery {
    /// Busca por nome, SKU ou código de barras
    pub busca: Option<String>,
    pub status: Option<ProdutoStatus>,
}
