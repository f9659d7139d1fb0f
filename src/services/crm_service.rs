// src/services/crm_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::{
        billing::ParcelaStatus,
        crm::{AtualizarCliente, Cliente, ClienteHistorico, NovoCliente},
        sales::Venda,
    },
    services::billing_service::BillingService,
};

#[derive(Clone)]
pub struct CrmService {
    clientes: Repository<Cliente>,
    vendas: Repository<Venda>,
    billing: BillingService,
    events: EventBus,
}

impl CrmService {
    pub fn new(
        clientes: Repository<Cliente>,
        vendas: Repository<Venda>,
        billing: BillingService,
        events: EventBus,
    ) -> Self {
        Self { clientes, vendas, billing, events }
    }

    // =========================================================================
    //  CADASTRO
    // =========================================================================

    /// Lista os clientes da conta em ordem alfabética.
    /// `busca` procura no nome, no CPF/CNPJ e no e-mail.
    pub async fn listar(&self, owner: &str, busca: Option<&str>) -> Result<Vec<Cliente>, AppError> {
        let mut filtro = owned_by(owner);
        if let Some(termo) = busca.map(str::trim).filter(|t| !t.is_empty()) {
            filtro = filtro.and(Filter::Or(vec![
                Filter::contains("nome_completo", termo),
                Filter::contains("cpf_cnpj", termo),
                Filter::contains("email", termo),
            ]));
        }
        self.clientes
            .filter(&filtro, Some(&SortSpec::asc("nome_completo")), Page::default())
            .await
    }

    pub async fn obter(&self, owner: &str, cliente_id: Uuid) -> Result<Cliente, AppError> {
        self.clientes.find_owned(owner, cliente_id).await
    }

    pub async fn contar(&self, owner: &str) -> Result<i64, AppError> {
        self.clientes.count(&owned_by(owner)).await
    }

    pub async fn criar(&self, owner: &str, payload: &NovoCliente) -> Result<Cliente, AppError> {
        let cliente = self.clientes.create(owner, payload).await?;

        tracing::info!("👤 Cliente '{}' cadastrado", cliente.nome_completo);
        self.events.publish(DomainEvent::ClientChanged {
            owner: owner.to_string(),
            cliente_id: cliente.id,
        });
        Ok(cliente)
    }

    pub async fn atualizar(
        &self,
        owner: &str,
        cliente_id: Uuid,
        patch: &AtualizarCliente,
    ) -> Result<Cliente, AppError> {
        self.clientes.find_owned(owner, cliente_id).await?;
        let cliente = self.clientes.update(cliente_id, patch).await?;

        self.events.publish(DomainEvent::ClientChanged {
            owner: owner.to_string(),
            cliente_id,
        });
        Ok(cliente)
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    /// Compras e parcelas do cliente, com os totais da ficha.
    pub async fn historico(
        &self,
        owner: &str,
        cliente_id: Uuid,
        hoje: NaiveDate,
    ) -> Result<ClienteHistorico, AppError> {
        let cliente = self.clientes.find_owned(owner, cliente_id).await?;

        let filtro = owned_by(owner).and(Filter::eq("cliente_id", cliente_id.to_string()));
        let vendas = self
            .vendas
            .filter(&filtro, Some(&SortSpec::desc("data_venda")), Page::default())
            .await?;
        let parcelas = self.billing.do_cliente(owner, cliente_id, hoje).await?;

        let total_comprado: Decimal = vendas.iter().map(|v| v.valor_total).sum();
        let total_em_aberto: Decimal = parcelas
            .iter()
            .filter(|c| c.parcela.status == ParcelaStatus::Pendente)
            .map(|c| c.parcela.valor)
            .sum();

        Ok(ClienteHistorico { cliente, vendas, parcelas, total_comprado, total_em_aberto })
    }
}
