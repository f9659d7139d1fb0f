// src/models/dashboard.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::UserProfile, billing::Cobranca, crm::Cliente, inventory::Produto, sales::Venda,
        subscription::Pagamento,
    },
};

// 1. Os cards do topo
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardResumo {
    pub total_clientes: i64,
    pub total_vendas: Decimal,
    /// Parcelas em aberto que ainda não venceram
    pub a_receber: Decimal,
    pub total_produtos: i64,
}

// 2. Gráfico de vendas (últimos 6 meses)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VendasMes {
    /// `MM/YYYY`
    pub mes: String,
    pub quantidade: i64,
    pub total: Decimal,
}

// 3. Produtos mais vendidos
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TopProduto {
    pub produto_id: Uuid,
    pub produto_nome: String,
    pub quantidade: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankingCliente {
    pub cliente_id: Uuid,
    pub cliente_nome: String,
    pub quantidade_compras: i64,
    pub total_comprado: Decimal,
}

/// Ficha de uma conta no console do admin.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsuarioDetalhes {
    pub usuario: UserProfile,
    pub clientes: Vec<Cliente>,
    /// Mais recentes primeiro
    pub vendas: Vec<Venda>,
    pub pagamentos: Vec<Pagamento>,
}

/// Painel do administrador da plataforma.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub total_usuarios: i64,
    pub usuarios_ativos: i64,
    /// Soma das mensalidades aprovadas
    pub receita_mensalidades: Decimal,
    /// Volume de vendas somado de todas as contas
    pub gmv: Decimal,
    pub top_produtos_mes: Vec<TopProduto>,
    pub ranking_clientes: Vec<RankingCliente>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoRelatorio {
    VendasMes,
    ClientesAtivos,
    Produtos,
    ParcelasAtrasadas,
}

// Aceita `vendas_mes` e `vendas-mes`; `produtos_mais_vendidos` é o nome antigo de `produtos`
impl FromStr for TipoRelatorio {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "vendas_mes" => Ok(TipoRelatorio::VendasMes),
            "clientes_ativos" => Ok(TipoRelatorio::ClientesAtivos),
            "produtos" | "produtos_mais_vendidos" => Ok(TipoRelatorio::Produtos),
            "parcelas_atrasadas" => Ok(TipoRelatorio::ParcelasAtrasadas),
            _ => Err(AppError::BusinessRule("relatorio.tipo_invalido")),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "tipo", content = "linhas", rename_all = "snake_case")]
pub enum DadosRelatorio {
    VendasMes(Vec<Venda>),
    ClientesAtivos(Vec<Cliente>),
    Produtos(Vec<Produto>),
    ParcelasAtrasadas(Vec<Cobranca>),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Relatorio {
    pub gerado_em: DateTime<Utc>,
    pub total_registros: usize,
    /// Soma dos valores, quando o relatório tem valores
    pub valor_total: Option<Decimal>,
    pub dados: DadosRelatorio,
}
