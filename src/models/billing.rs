// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::{Entity, EntityKind};

/// Status gravado da parcela. `atrasado` nunca é gravado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParcelaStatus {
    Pendente,
    Pago,
}

/// Status calculado na leitura.
/// A ordem das variantes é a ordem de exibição das cobranças.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusDerivado {
    Atrasado,
    Pendente,
    Pago,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Parcela {
    pub id: Uuid,
    pub venda_id: Uuid,
    pub numero_venda: i64,
    pub cliente_id: Uuid,
    pub cliente_nome: String,
    #[serde(default)]
    pub cliente_telefone: Option<String>,
    pub numero_parcela: u32,
    pub total_parcelas: u32,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    pub status: ParcelaStatus,
    #[serde(default)]
    pub data_pagamento: Option<NaiveDate>,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Parcela {
    const KIND: EntityKind = EntityKind::Parcela;
}

/// Identidade do cliente copiada para cada parcela.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClienteRef {
    pub cliente_id: Uuid,
    pub cliente_nome: String,
    pub cliente_telefone: Option<String>,
}

/// Parcela derivada de uma venda, ainda não gravada.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NovaParcela {
    #[serde(flatten)]
    pub cliente: ClienteRef,
    pub venda_id: Option<Uuid>,
    pub numero_venda: Option<i64>,
    pub numero_parcela: u32,
    pub total_parcelas: u32,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    pub status: ParcelaStatus,
    pub data_pagamento: Option<NaiveDate>,
}

/// Parcela anotada com o status derivado, como aparece na tela de cobranças.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Cobranca {
    #[serde(flatten)]
    pub parcela: Parcela,
    pub status_derivado: StatusDerivado,
    /// Só presente quando atrasada
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_atraso: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FiltroCobranca {
    #[default]
    Todos,
    Atrasado,
    Hoje,
    Pendente,
    Pagas,
}

/// Maior página aceita na listagem de cobranças
pub const PAGINA_MAXIMA: i64 = 100_000;

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CobrancasQuery {
    #[serde(default)]
    pub filtro: FiltroCobranca,
    /// Busca por nome do cliente ou número da venda
    pub busca: Option<String>,
    /// Começa em 1
    #[validate(range(min = 1, max = 100_000, message = "A página deve estar entre 1 e 100000."))]
    pub pagina: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginaCobrancas {
    pub itens: Vec<Cobranca>,
    pub pagina: i64,
    pub total: i64,
    pub total_paginas: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TotalizadorCobranca {
    pub quantidade: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ResumoCobrancas {
    pub atrasadas: TotalizadorCobranca,
    pub vencem_hoje: TotalizadorCobranca,
    /// Todas as parcelas em aberto, atrasadas ou não
    pub pendentes: TotalizadorCobranca,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PagarParcelaPayload {
    /// Padrão: hoje
    pub data_pagamento: Option<NaiveDate>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BaixaParcela {
    pub status: ParcelaStatus,
    pub data_pagamento: NaiveDate,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LembreteWhatsApp {
    pub mensagem: String,
    pub url: String,
}
