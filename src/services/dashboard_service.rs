// src/services/dashboard_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    models::{
        auth::{UserProfile, UserStatus},
        billing::{Parcela, ParcelaStatus},
        crm::Cliente,
        dashboard::{
            AdminDashboard, DadosRelatorio, DashboardResumo, RankingCliente, Relatorio,
            TipoRelatorio, TopProduto, UsuarioDetalhes, VendasMes,
        },
        inventory::Produto,
        sales::Venda,
    },
    read_models::{Leitura, ReadModels},
    services::{
        auth::AuthService, billing_service::BillingService,
        subscription_service::SubscriptionService,
    },
};

const MESES_GRAFICO: u32 = 6;
const TOP_PRODUTOS: usize = 5;
const TOP_CLIENTES: usize = 10;

// =============================================================================
//  AGREGAÇÕES (funções puras)
// =============================================================================

fn primeiro_dia(data: NaiveDate) -> NaiveDate {
    data.with_day(1).unwrap_or(data)
}

fn mesmo_mes(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Vendas dos últimos 6 meses (o atual incluso), do mais antigo ao atual.
/// Meses sem venda aparecem zerados.
pub fn vendas_por_mes(vendas: &[Venda], hoje: NaiveDate) -> Vec<VendasMes> {
    let inicio = primeiro_dia(hoje);
    (0..MESES_GRAFICO)
        .rev()
        .filter_map(|atras| inicio.checked_sub_months(Months::new(atras)))
        .map(|mes| {
            let do_mes: Vec<&Venda> = vendas.iter().filter(|v| mesmo_mes(v.data_venda, mes)).collect();
            VendasMes {
                mes: mes.format("%m/%Y").to_string(),
                quantidade: do_mes.len() as i64,
                total: do_mes.iter().map(|v| v.valor_total).sum(),
            }
        })
        .collect()
}

/// Produtos mais vendidos por quantidade.
pub fn top_produtos<'a>(vendas: impl IntoIterator<Item = &'a Venda>, limite: usize) -> Vec<TopProduto> {
    let mut por_produto: HashMap<Uuid, TopProduto> = HashMap::new();
    for item in vendas.into_iter().flat_map(|v| v.itens.iter()) {
        let entrada = por_produto.entry(item.produto_id).or_insert_with(|| TopProduto {
            produto_id: item.produto_id,
            produto_nome: item.produto_nome.clone(),
            quantidade: 0,
            total: Decimal::ZERO,
        });
        entrada.quantidade += item.quantidade;
        entrada.total += item.subtotal;
    }

    let mut ranking: Vec<TopProduto> = por_produto.into_values().collect();
    ranking.sort_by(|a, b| {
        b.quantidade
            .cmp(&a.quantidade)
            .then_with(|| a.produto_nome.cmp(&b.produto_nome))
    });
    ranking.truncate(limite);
    ranking
}

/// Clientes ordenados pelo total comprado.
pub fn ranking_clientes(vendas: &[Venda], limite: usize) -> Vec<RankingCliente> {
    let mut por_cliente: HashMap<Uuid, RankingCliente> = HashMap::new();
    for venda in vendas {
        let entrada = por_cliente.entry(venda.cliente_id).or_insert_with(|| RankingCliente {
            cliente_id: venda.cliente_id,
            cliente_nome: venda.cliente_nome.clone(),
            quantidade_compras: 0,
            total_comprado: Decimal::ZERO,
        });
        entrada.quantidade_compras += 1;
        entrada.total_comprado += venda.valor_total;
    }

    let mut ranking: Vec<RankingCliente> = por_cliente.into_values().collect();
    ranking.sort_by(|a, b| {
        b.total_comprado
            .cmp(&a.total_comprado)
            .then_with(|| a.cliente_nome.cmp(&b.cliente_nome))
    });
    ranking.truncate(limite);
    ranking
}

/// Parcelas pendentes que ainda não venceram (vencer hoje conta).
pub fn a_receber(parcelas: &[Parcela], hoje: NaiveDate) -> Decimal {
    parcelas
        .iter()
        .filter(|p| p.status == ParcelaStatus::Pendente && p.data_vencimento >= hoje)
        .map(|p| p.valor)
        .sum()
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct DashboardService {
    clientes: Repository<Cliente>,
    produtos: Repository<Produto>,
    vendas: Repository<Venda>,
    parcelas: Repository<Parcela>,
    billing: BillingService,
    auth: AuthService,
    subscription: SubscriptionService,
    read_models: Arc<ReadModels>,
}

impl DashboardService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clientes: Repository<Cliente>,
        produtos: Repository<Produto>,
        vendas: Repository<Venda>,
        parcelas: Repository<Parcela>,
        billing: BillingService,
        auth: AuthService,
        subscription: SubscriptionService,
        read_models: Arc<ReadModels>,
    ) -> Self {
        Self { clientes, produtos, vendas, parcelas, billing, auth, subscription, read_models }
    }

    async fn vendas_da_conta(&self, owner: &str) -> Result<Vec<Venda>, AppError> {
        self.vendas.list_owned(owner, Some(&SortSpec::desc("data_venda")), Page::default()).await
    }

    // --- Painel do usuário ---

    pub async fn resumo(&self, owner: &str, hoje: NaiveDate) -> Result<DashboardResumo, AppError> {
        let geracao = match self.read_models.dashboard(owner, hoje).await {
            Leitura::Cache(resumo) => return Ok(resumo),
            Leitura::Calcular(geracao) => geracao,
        };

        let vendas = self.vendas_da_conta(owner).await?;
        let abertas = self
            .parcelas
            .filter(&owned_by(owner).and(Filter::eq("status", "pendente")), None, Page::default())
            .await?;

        let resumo = DashboardResumo {
            total_clientes: self.clientes.count(&owned_by(owner)).await?,
            total_vendas: vendas.iter().map(|v| v.valor_total).sum(),
            a_receber: a_receber(&abertas, hoje),
            total_produtos: self.produtos.count(&owned_by(owner)).await?,
        };

        self.read_models.store_dashboard(owner, hoje, geracao, resumo.clone()).await;
        Ok(resumo)
    }

    pub async fn vendas_mensais(&self, owner: &str, hoje: NaiveDate) -> Result<Vec<VendasMes>, AppError> {
        let vendas = self.vendas_da_conta(owner).await?;
        Ok(vendas_por_mes(&vendas, hoje))
    }

    pub async fn top_produtos(&self, owner: &str) -> Result<Vec<TopProduto>, AppError> {
        let vendas = self.vendas_da_conta(owner).await?;
        Ok(top_produtos(&vendas, TOP_PRODUTOS))
    }

    // --- Painel do admin ---

    pub async fn admin(&self, hoje: NaiveDate) -> Result<AdminDashboard, AppError> {
        let geracao = match self.read_models.admin_dashboard(hoje).await {
            Leitura::Cache(painel) => return Ok(painel),
            Leitura::Calcular(geracao) => geracao,
        };

        let usuarios = self.auth.listar_usuarios().await?;
        let vendas = self
            .vendas
            .filter(&Filter::All, None, Page::default())
            .await?;
        let do_mes = vendas.iter().filter(|v| mesmo_mes(v.data_venda, hoje));

        let painel = AdminDashboard {
            total_usuarios: usuarios.len() as i64,
            usuarios_ativos: usuarios.iter().filter(|u| u.status == UserStatus::Ativo).count() as i64,
            receita_mensalidades: self.subscription.receita_aprovada().await?,
            gmv: vendas.iter().map(|v| v.valor_total).sum(),
            top_produtos_mes: top_produtos(do_mes, TOP_PRODUTOS),
            ranking_clientes: ranking_clientes(&vendas, TOP_CLIENTES),
        };

        self.read_models.store_admin_dashboard(hoje, geracao, painel.clone()).await;
        Ok(painel)
    }

    /// Uma conta com seus clientes, vendas e mensalidades.
    pub async fn detalhes_usuario(&self, usuario_id: Uuid) -> Result<UsuarioDetalhes, AppError> {
        let usuario = self.auth.obter_usuario(usuario_id).await?;
        let owner = usuario.email.as_str();

        let clientes = self
            .clientes
            .list_owned(owner, Some(&SortSpec::asc("nome_completo")), Page::default())
            .await?;
        let vendas = self.vendas_da_conta(owner).await?;
        let pagamentos = self.subscription.meus_pagamentos(&usuario).await?;

        Ok(UsuarioDetalhes {
            usuario: UserProfile::from(usuario),
            clientes,
            vendas,
            pagamentos,
        })
    }

    // --- Relatórios ---

    pub async fn relatorio(
        &self,
        owner: &str,
        tipo: TipoRelatorio,
        hoje: NaiveDate,
    ) -> Result<Relatorio, AppError> {
        let (dados, valor_total) = match tipo {
            TipoRelatorio::VendasMes => {
                let vendas: Vec<Venda> = self
                    .vendas_da_conta(owner)
                    .await?
                    .into_iter()
                    .filter(|v| mesmo_mes(v.data_venda, hoje))
                    .collect();
                let total = vendas.iter().map(|v| v.valor_total).sum();
                (DadosRelatorio::VendasMes(vendas), Some(total))
            }
            TipoRelatorio::ClientesAtivos => {
                let filtro = owned_by(owner).and(Filter::eq("status", "ativo"));
                let clientes = self
                    .clientes
                    .filter(&filtro, Some(&SortSpec::asc("nome_completo")), Page::default())
                    .await?;
                (DadosRelatorio::ClientesAtivos(clientes), None)
            }
            TipoRelatorio::Produtos => {
                let produtos = self
                    .produtos
                    .list_owned(owner, Some(&SortSpec::asc("nome_produto")), Page::default())
                    .await?;
                // Valor do estoque a preço de venda
                let total = produtos
                    .iter()
                    .map(|p| p.preco_venda * Decimal::from(p.quantidade_estoque.max(0)))
                    .sum();
                (DadosRelatorio::Produtos(produtos), Some(total))
            }
            TipoRelatorio::ParcelasAtrasadas => {
                let atrasadas = self.billing.atrasadas(owner, hoje).await?;
                let total = atrasadas.iter().map(|c| c.parcela.valor).sum();
                (DadosRelatorio::ParcelasAtrasadas(atrasadas), Some(total))
            }
        };

        let total_registros = match &dados {
            DadosRelatorio::VendasMes(v) => v.len(),
            DadosRelatorio::ClientesAtivos(c) => c.len(),
            DadosRelatorio::Produtos(p) => p.len(),
            DadosRelatorio::ParcelasAtrasadas(p) => p.len(),
        };

        tracing::info!("📊 Relatório {:?} gerado para {} ({} registros)", tipo, owner, total_registros);
        Ok(Relatorio { gerado_em: Utc::now(), total_registros, valor_total, dados })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sales::{FormaPagamento, ItemVenda, VendaStatus};
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn data(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn venda(cliente: (&str, Uuid), data_venda: NaiveDate, itens: &[(Uuid, &str, i64, Decimal)]) -> Venda {
        let itens: Vec<ItemVenda> = itens
            .iter()
            .map(|(id, nome, q, preco)| ItemVenda {
                produto_id: *id,
                produto_nome: nome.to_string(),
                quantidade: *q,
                preco_unitario: *preco,
                subtotal: *preco * Decimal::from(*q),
            })
            .collect();
        Venda {
            id: Uuid::new_v4(),
            numero_venda: 1,
            cliente_id: cliente.1,
            cliente_nome: cliente.0.into(),
            cliente_telefone: None,
            valor_total: itens.iter().map(|i| i.subtotal).sum(),
            itens,
            forma_pagamento: FormaPagamento::Pix,
            status: VendaStatus::Pendente,
            quantidade_parcelas: None,
            observacoes: None,
            data_venda,
            created_date: Utc::now(),
            updated_date: Utc::now(),
            created_by: "ana@loja.com".into(),
        }
    }

    #[test]
    fn monthly_chart_covers_six_months_with_gaps() {
        let maria = ("Maria", Uuid::new_v4());
        let caneta = Uuid::new_v4();
        let vendas = vec![
            venda(maria, data(2024, 3, 5), &[(caneta, "Caneta", 2, dec!(10))]),
            venda(maria, data(2024, 3, 20), &[(caneta, "Caneta", 1, dec!(10))]),
            venda(maria, data(2023, 12, 31), &[(caneta, "Caneta", 1, dec!(10))]),
            // Fora da janela
            venda(maria, data(2023, 9, 30), &[(caneta, "Caneta", 9, dec!(10))]),
        ];

        let grafico = vendas_por_mes(&vendas, data(2024, 3, 31));
        let meses: Vec<&str> = grafico.iter().map(|m| m.mes.as_str()).collect();
        assert_eq!(meses, vec!["10/2023", "11/2023", "12/2023", "01/2024", "02/2024", "03/2024"]);
        assert_eq!(grafico[2].total, dec!(10));
        assert_eq!(grafico[5].quantidade, 2);
        assert_eq!(grafico[5].total, dec!(30));
        assert_eq!(grafico[0].quantidade, 0);
    }

    #[test]
    fn top_products_by_quantity() {
        let maria = ("Maria", Uuid::new_v4());
        let (caneta, caderno, lapis) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let vendas = vec![
            venda(maria, data(2024, 3, 1), &[(caneta, "Caneta", 2, dec!(5)), (caderno, "Caderno", 1, dec!(30))]),
            venda(maria, data(2024, 3, 2), &[(caneta, "Caneta", 3, dec!(5)), (lapis, "Lápis", 4, dec!(1))]),
        ];

        let top = top_produtos(&vendas, 2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].produto_nome.as_str(), top[0].quantidade, top[0].total), ("Caneta", 5, dec!(25)));
        assert_eq!(top[1].produto_nome, "Lápis");
    }

    #[test]
    fn client_ranking_by_total_spent() {
        let maria = ("Maria", Uuid::new_v4());
        let joao = ("João", Uuid::new_v4());
        let p = Uuid::new_v4();
        let vendas = vec![
            venda(maria, data(2024, 3, 1), &[(p, "Caneta", 1, dec!(10))]),
            venda(joao, data(2024, 3, 1), &[(p, "Caneta", 1, dec!(50))]),
            venda(maria, data(2024, 3, 2), &[(p, "Caneta", 2, dec!(10))]),
        ];

        let ranking = ranking_clientes(&vendas, 10);
        assert_eq!(ranking[0].cliente_nome, "João");
        assert_eq!(ranking[1].quantidade_compras, 2);
        assert_eq!(ranking[1].total_comprado, dec!(30));
    }

    #[test]
    fn report_type_accepts_both_separators() {
        assert_eq!(TipoRelatorio::from_str("vendas-mes").unwrap(), TipoRelatorio::VendasMes);
        assert_eq!(TipoRelatorio::from_str("parcelas_atrasadas").unwrap(), TipoRelatorio::ParcelasAtrasadas);
        assert_eq!(TipoRelatorio::from_str("produtos-mais-vendidos").unwrap(), TipoRelatorio::Produtos);
        assert!(matches!(
            TipoRelatorio::from_str("lucro").unwrap_err(),
            AppError::BusinessRule("relatorio.tipo_invalido")
        ));
    }
}
