// src/services/sale_service.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::{
        billing::{ClienteRef, Parcela},
        crm::Cliente,
        inventory::Produto,
        sales::{
            CarrinhoResumo, FormaPagamento, RegistrarVendaPayload, Venda, VendaRegistrada,
            VendaRegistro, VendasQuery,
        },
    },
    services::{cart::{find_by_barcode, SaleDraft}, installment_plan::{gerar_parcelas, MAX_PARCELAS}, inventory_service::InventoryService},
};

const LIMITE_PADRAO: i64 = 100;

/// Checagem do payload antes de qualquer leitura no store.
/// Mesma ordem de mensagens da tela de vendas.
pub fn validar_payload(payload: &RegistrarVendaPayload) -> Result<(), AppError> {
    if payload.cliente_id.is_none() {
        return Err(AppError::BusinessRule("venda.cliente_obrigatorio"));
    }
    if payload.itens.is_empty() {
        return Err(AppError::BusinessRule("venda.carrinho_vazio"));
    }
    let item_invalido = payload.itens.iter().any(|item| {
        let sem_produto = item.produto_id.is_none()
            && item.codigo_barras.as_deref().map_or(true, |c| c.trim().is_empty());
        item.quantidade <= 0 || sem_produto
    });
    if item_invalido {
        return Err(AppError::BusinessRule("venda.item_invalido"));
    }
    if payload.forma_pagamento == FormaPagamento::Crediario {
        match payload.quantidade_parcelas.unwrap_or(0) {
            0 => return Err(AppError::BusinessRule("venda.parcelas_obrigatorias")),
            n if n > MAX_PARCELAS => return Err(AppError::BusinessRule("venda.parcelas_limite")),
            _ => {}
        }
    }
    Ok(())
}

fn produto_inexistente(err: AppError) -> AppError {
    match err {
        AppError::ResourceNotFound(_) => AppError::BusinessRule("venda.produto_inexistente"),
        other => other,
    }
}

#[derive(Clone)]
pub struct SaleService {
    vendas: Repository<Venda>,
    parcelas: Repository<Parcela>,
    clientes: Repository<Cliente>,
    inventory: InventoryService,
    events: EventBus,
}

impl SaleService {
    pub fn new(
        vendas: Repository<Venda>,
        parcelas: Repository<Parcela>,
        clientes: Repository<Cliente>,
        inventory: InventoryService,
        events: EventBus,
    ) -> Self {
        Self { vendas, parcelas, clientes, inventory, events }
    }

    /// Monta o carrinho a partir do payload, lendo cliente e produtos da conta.
    async fn montar_carrinho(
        &self,
        owner: &str,
        payload: &RegistrarVendaPayload,
    ) -> Result<SaleDraft, AppError> {
        let mut draft = SaleDraft::new(payload.forma_pagamento);
        draft.set_payment(payload.forma_pagamento, payload.quantidade_parcelas)?;
        draft.set_notes(payload.observacoes.clone());

        if let Some(cliente_id) = payload.cliente_id {
            let cliente = self.clientes.find_owned(owner, cliente_id).await?;
            draft.select_client(&cliente);
        }

        // Catálogo só é carregado se algum item veio por código de barras
        let mut catalogo: Option<Vec<Produto>> = None;

        for item in &payload.itens {
            match (item.produto_id, item.codigo_barras.as_deref()) {
                (Some(produto_id), _) => {
                    let produto = self
                        .inventory
                        .obter(owner, produto_id)
                        .await
                        .map_err(produto_inexistente)?;
                    draft.add_product(&produto, item.quantidade)?;
                }
                (None, Some(codigo)) => {
                    if catalogo.is_none() {
                        catalogo = Some(self.inventory.catalogo(owner).await?);
                    }
                    let produtos = catalogo.as_deref().unwrap_or_default();
                    let produto = find_by_barcode(produtos, codigo)
                        .ok_or(AppError::BusinessRule("venda.produto_inexistente"))?;
                    draft.add_product(produto, item.quantidade)?;
                }
                (None, None) => return Err(AppError::BusinessRule("venda.item_invalido")),
            }
        }

        Ok(draft)
    }

    /// Prévia do carrinho, sem gravar nada.
    pub async fn preview(
        &self,
        owner: &str,
        payload: &RegistrarVendaPayload,
        hoje: NaiveDate,
    ) -> Result<CarrinhoResumo, AppError> {
        let draft = self.montar_carrinho(owner, payload).await?;
        Ok(draft.summary(payload.data_venda.unwrap_or(hoje)))
    }

    // --- REGISTRAR VENDA ---
    // venda -> parcelas (crediário) -> baixa de estoque, nessa ordem.
    // Não há transação: se um passo falhar, os anteriores ficam gravados
    // e o erro lista o que já foi feito.
    pub async fn registrar(
        &self,
        owner: &str,
        payload: RegistrarVendaPayload,
        hoje: NaiveDate,
    ) -> Result<VendaRegistrada, AppError> {
        validar_payload(&payload)?;

        let draft = self.montar_carrinho(owner, &payload).await?;
        let nova = draft.validate(payload.data_venda.unwrap_or(hoje))?;

        // Duas vendas simultâneas podem sair com o mesmo número; não há trava
        let numero_venda = self.vendas.count(&owned_by(owner)).await? + 1;
        let venda = self
            .vendas
            .create(
                owner,
                &VendaRegistro {
                    venda: &nova,
                    numero_venda,
                    status: nova.forma_pagamento.status_inicial(),
                },
            )
            .await?;

        tracing::info!(
            "🛒 Venda #{} registrada para '{}' ({} - R$ {})",
            venda.numero_venda,
            venda.cliente_nome,
            venda.forma_pagamento.label(),
            venda.valor_total
        );
        self.events.publish(DomainEvent::SaleCreated {
            owner: owner.to_string(),
            venda_id: venda.id,
            valor_total: venda.valor_total,
        });

        let mut committed = vec![format!("venda:{}", venda.id)];
        let parcelas = match self.efeitos_da_venda(owner, &venda, &mut committed).await {
            Ok(parcelas) => parcelas,
            Err(e) => {
                return Err(AppError::PartialFailure {
                    operation: "registrar_venda",
                    committed,
                    cause: e.to_string(),
                });
            }
        };

        Ok(VendaRegistrada { venda, parcelas })
    }

    async fn efeitos_da_venda(
        &self,
        owner: &str,
        venda: &Venda,
        committed: &mut Vec<String>,
    ) -> Result<usize, AppError> {
        let mut quantidade_parcelas = 0;

        if let (FormaPagamento::Crediario, Some(n)) = (venda.forma_pagamento, venda.quantidade_parcelas) {
            let cliente = ClienteRef {
                cliente_id: venda.cliente_id,
                cliente_nome: venda.cliente_nome.clone(),
                cliente_telefone: venda.cliente_telefone.clone(),
            };
            let mut plano = gerar_parcelas(venda.valor_total, n, venda.data_venda, &cliente);
            for parcela in plano.iter_mut() {
                parcela.venda_id = Some(venda.id);
                parcela.numero_venda = Some(venda.numero_venda);
            }

            self.parcelas.bulk_create(owner, &plano).await?;
            quantidade_parcelas = plano.len();
            committed.push(format!("parcelas:{}", quantidade_parcelas));

            tracing::info!("📅 {} parcelas geradas para a venda #{}", quantidade_parcelas, venda.numero_venda);
            self.events.publish(DomainEvent::InstallmentsScheduled {
                owner: owner.to_string(),
                venda_id: venda.id,
                quantidade: quantidade_parcelas,
            });
        }

        for item in &venda.itens {
            let baixa = self
                .inventory
                .baixar_estoque(owner, item.produto_id, item.quantidade, venda.id)
                .await?;
            committed.push(format!("estoque:{}", item.produto_id));

            self.inventory.registrar_saida(owner, baixa).await?;
            committed.push(format!("movimentacao:{}", item.produto_id));
        }

        Ok(quantidade_parcelas)
    }

    pub async fn listar(&self, owner: &str, query: &VendasQuery) -> Result<Vec<Venda>, AppError> {
        let mut filtro = owned_by(owner);
        if let Some(cliente_id) = query.cliente_id {
            filtro = filtro.and(Filter::eq("cliente_id", cliente_id.to_string()));
        }
        if let Some(termo) = query.busca.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filtro = filtro.and(Filter::contains("cliente_nome", termo));
        }
        let limite = query.limite.unwrap_or(LIMITE_PADRAO).clamp(1, 1000);

        self.vendas
            .filter(&filtro, Some(&SortSpec::desc("created_date")), Page::limit(limite))
            .await
    }

    pub async fn obter(&self, owner: &str, venda_id: Uuid) -> Result<Venda, AppError> {
        self.vendas.find_owned(owner, venda_id).await
    }

    /// Todas as vendas da conta, da mais recente para a mais antiga.
    pub async fn todas(&self, owner: &str) -> Result<Vec<Venda>, AppError> {
        self.vendas
            .list_owned(owner, Some(&SortSpec::desc("created_date")), Page::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{EntityKind, EntityStore, MemoryStore},
        models::{
            billing::ParcelaStatus,
            crm::NovoCliente,
            inventory::{NovoProduto, ProdutoStatus},
            sales::{ItemCarrinhoPayload, VendaStatus},
        },
    };
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::Arc;

    const OWNER: &str = "ana@loja.com";

    fn hoje() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    // Store que falha nas gravações escolhidas por `falha`
    struct FailingStore {
        inner: MemoryStore,
        falha: fn(EntityKind, &Value) -> bool,
    }

    impl FailingStore {
        fn parcelas() -> Self {
            Self { inner: MemoryStore::new(), falha: |kind, _| kind == EntityKind::Parcela }
        }

        // Só as saídas: a entrada do estoque inicial precisa passar
        fn movimentacoes_de_saida() -> Self {
            Self {
                inner: MemoryStore::new(),
                falha: |kind, fields| kind == EntityKind::MovimentacaoEstoque && fields["tipo"] == "saida",
            }
        }

        fn recusa(&self, kind: EntityKind, fields: &Value) -> Result<(), AppError> {
            if (self.falha)(kind, fields) {
                return Err(anyhow::anyhow!("conexão perdida").into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntityStore for FailingStore {
        async fn filter(
            &self,
            kind: EntityKind,
            predicate: &Filter,
            sort: Option<&SortSpec>,
            page: Page,
        ) -> Result<Vec<Value>, AppError> {
            self.inner.filter(kind, predicate, sort, page).await
        }
        async fn count(&self, kind: EntityKind, predicate: &Filter) -> Result<i64, AppError> {
            self.inner.count(kind, predicate).await
        }
        async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Value>, AppError> {
            self.inner.get(kind, id).await
        }
        async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, AppError> {
            self.recusa(kind, &fields)?;
            self.inner.create(kind, fields).await
        }
        async fn update(&self, kind: EntityKind, id: Uuid, partial: Value) -> Result<Value, AppError> {
            self.inner.update(kind, id, partial).await
        }
        async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<(), AppError> {
            self.inner.delete(kind, id).await
        }
        async fn bulk_create(&self, kind: EntityKind, records: Vec<Value>) -> Result<(), AppError> {
            for record in &records {
                self.recusa(kind, record)?;
            }
            self.inner.bulk_create(kind, records).await
        }
    }

    struct Fixture {
        service: SaleService,
        parcelas: Repository<Parcela>,
        cliente: Cliente,
        caneta: Produto,
        caderno: Produto,
    }

    async fn fixture(store: Arc<dyn EntityStore>) -> Fixture {
        let events = EventBus::default();
        let clientes = Repository::<Cliente>::new(store.clone());
        let inventory = InventoryService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            events.clone(),
        );
        let parcelas = Repository::<Parcela>::new(store.clone());
        let service = SaleService::new(
            Repository::new(store.clone()),
            parcelas.clone(),
            clientes.clone(),
            inventory.clone(),
            events,
        );

        let cliente = clientes
            .create(
                OWNER,
                &NovoCliente {
                    nome_completo: "Maria Souza".into(),
                    telefone: Some("(11) 98888-7777".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let produto = |nome: &str, preco: Decimal, codigo: &str| NovoProduto {
            nome_produto: nome.into(),
            descricao: None,
            sku: None,
            codigo_barras: Some(codigo.into()),
            categoria: None,
            unidade: "un".into(),
            preco_venda: preco,
            preco_custo: None,
            quantidade_estoque: 10,
            estoque_minimo: 2,
            status: ProdutoStatus::Ativo,
        };
        let caneta = inventory.criar(OWNER, &produto("Caneta", dec!(50.00), "789001")).await.unwrap();
        let caderno = inventory.criar(OWNER, &produto("Caderno", dec!(100.00), "789002")).await.unwrap();

        Fixture { service, parcelas, cliente, caneta, caderno }
    }

    fn item(produto_id: Uuid, quantidade: i64) -> ItemCarrinhoPayload {
        ItemCarrinhoPayload { produto_id: Some(produto_id), codigo_barras: None, quantidade }
    }

    fn payload(cliente_id: Option<Uuid>, itens: Vec<ItemCarrinhoPayload>, forma: FormaPagamento, n: Option<u32>) -> RegistrarVendaPayload {
        RegistrarVendaPayload {
            cliente_id,
            itens,
            forma_pagamento: forma,
            quantidade_parcelas: n,
            observacoes: None,
            data_venda: None,
        }
    }

    fn regra(err: AppError) -> &'static str {
        match err {
            AppError::BusinessRule(key) => key,
            other => panic!("esperado BusinessRule, veio {:?}", other),
        }
    }

    #[test]
    fn payload_checks_follow_screen_order() {
        let id = Uuid::new_v4();

        let sem_cliente = payload(None, vec![], FormaPagamento::Pix, None);
        assert_eq!(regra(validar_payload(&sem_cliente).unwrap_err()), "venda.cliente_obrigatorio");

        let vazio = payload(Some(id), vec![], FormaPagamento::Pix, None);
        assert_eq!(regra(validar_payload(&vazio).unwrap_err()), "venda.carrinho_vazio");

        let zerado = payload(Some(id), vec![item(id, 0)], FormaPagamento::Pix, None);
        assert_eq!(regra(validar_payload(&zerado).unwrap_err()), "venda.item_invalido");

        let sem_parcelas = payload(Some(id), vec![item(id, 1)], FormaPagamento::Crediario, Some(0));
        assert_eq!(regra(validar_payload(&sem_parcelas).unwrap_err()), "venda.parcelas_obrigatorias");

        let demais = payload(Some(id), vec![item(id, 1)], FormaPagamento::Crediario, Some(MAX_PARCELAS + 1));
        assert_eq!(regra(validar_payload(&demais).unwrap_err()), "venda.parcelas_limite");

        let ok = payload(Some(id), vec![item(id, 1)], FormaPagamento::Crediario, Some(3));
        assert!(validar_payload(&ok).is_ok());
    }

    #[tokio::test]
    async fn preview_rejects_absurd_installment_counts() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let p = payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::Crediario, Some(2_000_000));

        let err = f.service.preview(OWNER, &p, hoje()).await.unwrap_err();
        assert_eq!(regra(err), "venda.parcelas_limite");
    }

    #[tokio::test]
    async fn crediario_sale_creates_installments_and_decrements_stock() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let p = payload(
            Some(f.cliente.id),
            vec![item(f.caneta.id, 2), item(f.caderno.id, 2)],
            FormaPagamento::Crediario,
            Some(3),
        );

        let registrada = f.service.registrar(OWNER, p, hoje()).await.unwrap();

        assert_eq!(registrada.venda.numero_venda, 1);
        assert_eq!(registrada.venda.valor_total, dec!(300.00));
        assert_eq!(registrada.venda.status, VendaStatus::Pendente);
        assert_eq!(registrada.parcelas, 3);

        let parcelas = f
            .parcelas
            .filter(&owned_by(OWNER), Some(&SortSpec::asc("numero_parcela")), Page::default())
            .await
            .unwrap();
        assert_eq!(parcelas.len(), 3);
        assert!(parcelas.iter().all(|p| p.valor == dec!(100.00)));
        assert!(parcelas.iter().all(|p| p.venda_id == registrada.venda.id));
        assert!(parcelas.iter().all(|p| p.status == ParcelaStatus::Pendente));
        assert_eq!(parcelas[0].data_vencimento, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let caneta = f.service.inventory.obter(OWNER, f.caneta.id).await.unwrap();
        assert_eq!(caneta.quantidade_estoque, 8);
    }

    #[tokio::test]
    async fn cash_sale_is_born_paid_and_numbers_increase() {
        let f = fixture(Arc::new(MemoryStore::new())).await;

        let primeira = f
            .service
            .registrar(OWNER, payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::AVista, None), hoje())
            .await
            .unwrap();
        let segunda = f
            .service
            .registrar(OWNER, payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::Pix, Some(4)), hoje())
            .await
            .unwrap();

        assert_eq!(primeira.venda.status, VendaStatus::Pago);
        assert_eq!(segunda.venda.status, VendaStatus::Pendente);
        assert_eq!(segunda.venda.numero_venda, 2);
        // Parcelas só existem no crediário
        assert_eq!(segunda.venda.quantidade_parcelas, None);
        assert_eq!(segunda.parcelas, 0);
    }

    #[tokio::test]
    async fn barcode_items_are_resolved_from_the_catalog() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let p = payload(
            Some(f.cliente.id),
            vec![ItemCarrinhoPayload { produto_id: None, codigo_barras: Some(" 789002 ".into()), quantidade: 1 }],
            FormaPagamento::Pix,
            None,
        );

        let resumo = f.service.preview(OWNER, &p, hoje()).await.unwrap();
        assert_eq!(resumo.itens[0].produto_id, f.caderno.id);
        assert_eq!(resumo.valor_total, dec!(100.00));
    }

    #[tokio::test]
    async fn unknown_product_is_a_business_error() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let p = payload(Some(f.cliente.id), vec![item(Uuid::new_v4(), 1)], FormaPagamento::Pix, None);

        let err = f.service.registrar(OWNER, p, hoje()).await.unwrap_err();
        assert_eq!(regra(err), "venda.produto_inexistente");
    }

    #[tokio::test]
    async fn failure_after_sale_reports_committed_steps() {
        let f = fixture(Arc::new(FailingStore::parcelas())).await;
        let p = payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::Crediario, Some(2));

        let err = f.service.registrar(OWNER, p, hoje()).await.unwrap_err();
        match err {
            AppError::PartialFailure { operation, committed, .. } => {
                assert_eq!(operation, "registrar_venda");
                assert_eq!(committed.len(), 1);
                assert!(committed[0].starts_with("venda:"));
            }
            other => panic!("esperado PartialFailure, veio {:?}", other),
        }

        // A venda continua gravada e o estoque não foi baixado
        let vendas = f.service.todas(OWNER).await.unwrap();
        assert_eq!(vendas.len(), 1);
        let caneta = f.service.inventory.obter(OWNER, f.caneta.id).await.unwrap();
        assert_eq!(caneta.quantidade_estoque, 10);
    }

    #[tokio::test]
    async fn failed_movement_write_still_reports_the_stock_change() {
        let f = fixture(Arc::new(FailingStore::movimentacoes_de_saida())).await;
        let p = payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::Pix, None);

        let err = f.service.registrar(OWNER, p, hoje()).await.unwrap_err();
        match err {
            AppError::PartialFailure { committed, .. } => {
                assert_eq!(committed.len(), 2);
                assert!(committed[0].starts_with("venda:"));
                assert_eq!(committed[1], format!("estoque:{}", f.caneta.id));
            }
            other => panic!("esperado PartialFailure, veio {:?}", other),
        }

        // O saldo foi baixado mesmo sem a movimentação
        let caneta = f.service.inventory.obter(OWNER, f.caneta.id).await.unwrap();
        assert_eq!(caneta.quantidade_estoque, 9);
    }

    #[tokio::test]
    async fn listing_filters_by_client_name() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        f.service
            .registrar(OWNER, payload(Some(f.cliente.id), vec![item(f.caneta.id, 1)], FormaPagamento::Pix, None), hoje())
            .await
            .unwrap();

        let achadas = f
            .service
            .listar(OWNER, &VendasQuery { busca: Some("maria".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(achadas.len(), 1);

        let nenhuma = f
            .service
            .listar(OWNER, &VendasQuery { busca: Some("joão".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(nenhuma.is_empty());
    }
}
