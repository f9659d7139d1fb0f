// src/services/inventory_service.rs

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::inventory::{
        AjusteEstoquePayload, AtualizarProduto, MovimentacaoEstoque, NovaMovimentacao, NovoProduto,
        Produto, ProdutoStatus, ProdutosQuery, TipoMovimentacao,
    },
};

#[derive(Serialize)]
struct NovoSaldo {
    quantidade_estoque: i64,
}

/// Saldo resultante de uma movimentação.
/// `Ajuste` define o saldo; as demais somam ou subtraem. Não há piso em zero.
pub fn saldo_apos(atual: i64, tipo: TipoMovimentacao, quantidade: i64) -> i64 {
    match tipo {
        TipoMovimentacao::Entrada => atual + quantidade,
        TipoMovimentacao::Saida => atual - quantidade,
        TipoMovimentacao::Ajuste => quantidade,
    }
}

#[derive(Clone)]
pub struct InventoryService {
    produtos: Repository<Produto>,
    movimentacoes: Repository<MovimentacaoEstoque>,
    events: EventBus,
}

impl InventoryService {
    pub fn new(
        produtos: Repository<Produto>,
        movimentacoes: Repository<MovimentacaoEstoque>,
        events: EventBus,
    ) -> Self {
        Self { produtos, movimentacoes, events }
    }

    pub async fn listar(&self, owner: &str, query: &ProdutosQuery) -> Result<Vec<Produto>, AppError> {
        let mut filtro = owned_by(owner);
        if let Some(status) = query.status {
            filtro = filtro.and(Filter::eq("status", serde_json::to_value(status)?));
        }
        if let Some(termo) = query.busca.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filtro = filtro.and(Filter::Or(vec![
                Filter::contains("nome_produto", termo),
                Filter::contains("sku", termo),
                Filter::contains("codigo_barras", termo),
            ]));
        }
        self.produtos
            .filter(&filtro, Some(&SortSpec::asc("nome_produto")), Page::default())
            .await
    }

    /// Catálogo completo da conta (leitura de código de barras no carrinho).
    pub async fn catalogo(&self, owner: &str) -> Result<Vec<Produto>, AppError> {
        self.produtos.list_owned(owner, None, Page::default()).await
    }

    pub async fn obter(&self, owner: &str, produto_id: Uuid) -> Result<Produto, AppError> {
        self.produtos.find_owned(owner, produto_id).await
    }

    pub async fn contar(&self, owner: &str) -> Result<i64, AppError> {
        self.produtos.count(&owned_by(owner)).await
    }

    pub async fn criar(&self, owner: &str, payload: &NovoProduto) -> Result<Produto, AppError> {
        let produto = self.produtos.create(owner, payload).await?;

        if produto.quantidade_estoque > 0 {
            self.registrar_movimentacao(
                owner,
                NovaMovimentacao {
                    produto_id: produto.id,
                    tipo: TipoMovimentacao::Entrada,
                    quantidade: produto.quantidade_estoque,
                    saldo_anterior: 0,
                    saldo_atual: produto.quantidade_estoque,
                    motivo: Some("Estoque inicial".into()),
                    venda_id: None,
                },
            )
            .await?;
        }

        tracing::info!("📦 Produto '{}' cadastrado", produto.nome_produto);
        self.events.publish(DomainEvent::ProductChanged {
            owner: owner.to_string(),
            produto_id: produto.id,
        });
        Ok(produto)
    }

    pub async fn atualizar(
        &self,
        owner: &str,
        produto_id: Uuid,
        patch: &AtualizarProduto,
    ) -> Result<Produto, AppError> {
        self.produtos.find_owned(owner, produto_id).await?;
        let produto = self.produtos.update(produto_id, patch).await?;

        self.events.publish(DomainEvent::ProductChanged {
            owner: owner.to_string(),
            produto_id,
        });
        Ok(produto)
    }

    /// Movimentação manual (entrada, saída ou inventário).
    pub async fn ajustar(
        &self,
        owner: &str,
        produto_id: Uuid,
        payload: AjusteEstoquePayload,
    ) -> Result<Produto, AppError> {
        let produto = self.produtos.find_owned(owner, produto_id).await?;
        let saldo_anterior = produto.quantidade_estoque;
        let saldo_atual = saldo_apos(saldo_anterior, payload.tipo, payload.quantidade);

        let produto = self
            .produtos
            .update(produto_id, &NovoSaldo { quantidade_estoque: saldo_atual })
            .await?;

        self.registrar_movimentacao(
            owner,
            NovaMovimentacao {
                produto_id,
                tipo: payload.tipo,
                quantidade: payload.quantidade,
                saldo_anterior,
                saldo_atual,
                motivo: payload.motivo,
                venda_id: None,
            },
        )
        .await?;

        self.events.publish(DomainEvent::ProductChanged {
            owner: owner.to_string(),
            produto_id,
        });
        Ok(produto)
    }

    /// Baixa de estoque de uma venda concluída.
    /// Lê o saldo atual e grava `saldo - quantidade`, sem conferir se há estoque.
    ///
    /// O saldo gravado e o evento valem sozinhos; a movimentação que
    /// documenta a saída é gravada depois, em [`Self::registrar_saida`].
    pub async fn baixar_estoque(
        &self,
        owner: &str,
        produto_id: Uuid,
        quantidade: i64,
        venda_id: Uuid,
    ) -> Result<BaixaEstoque, AppError> {
        let produto = self.produtos.find_owned(owner, produto_id).await?;
        let saldo_anterior = produto.quantidade_estoque;
        let saldo_atual = saldo_apos(saldo_anterior, TipoMovimentacao::Saida, quantidade);

        let produto = self
            .produtos
            .update(produto_id, &NovoSaldo { quantidade_estoque: saldo_atual })
            .await?;

        self.events.publish(DomainEvent::StockDecremented {
            owner: owner.to_string(),
            produto_id,
            quantidade,
        });

        if saldo_atual < 0 {
            tracing::warn!(
                "⚠️ Estoque de '{}' ficou negativo ({}) após a venda {}",
                produto.nome_produto, saldo_atual, venda_id
            );
        }

        Ok(BaixaEstoque {
            produto,
            movimentacao: NovaMovimentacao {
                produto_id,
                tipo: TipoMovimentacao::Saida,
                quantidade,
                saldo_anterior,
                saldo_atual,
                motivo: Some("Venda".into()),
                venda_id: Some(venda_id),
            },
        })
    }

    pub async fn registrar_saida(&self, owner: &str, baixa: BaixaEstoque) -> Result<Produto, AppError> {
        self.registrar_movimentacao(owner, baixa.movimentacao).await?;
        Ok(baixa.produto)
    }

    pub async fn movimentacoes(
        &self,
        owner: &str,
        produto_id: Uuid,
    ) -> Result<Vec<MovimentacaoEstoque>, AppError> {
        self.produtos.find_owned(owner, produto_id).await?;
        let filtro = owned_by(owner).and(Filter::eq("produto_id", produto_id.to_string()));
        self.movimentacoes
            .filter(&filtro, Some(&SortSpec::desc("created_date")), Page::default())
            .await
    }

    /// Produtos ativos no estoque mínimo ou abaixo dele.
    pub async fn estoque_baixo(&self, owner: &str) -> Result<Vec<Produto>, AppError> {
        let filtro = owned_by(owner).and(Filter::eq("status", "ativo"));
        let mut produtos: Vec<Produto> = self
            .produtos
            .filter(&filtro, None, Page::default())
            .await?
            .into_iter()
            .filter(|p| p.status == ProdutoStatus::Ativo && p.estoque_baixo())
            .collect();
        produtos.sort_by_key(|p| p.quantidade_estoque - p.estoque_minimo);
        Ok(produtos)
    }

    async fn registrar_movimentacao(&self, owner: &str, mov: NovaMovimentacao) -> Result<(), AppError> {
        self.movimentacoes.create(owner, &mov).await?;
        Ok(())
    }
}

/// Saldo já baixado, com a movimentação ainda por gravar.
#[derive(Debug)]
pub struct BaixaEstoque {
    pub produto: Produto,
    movimentacao: NovaMovimentacao,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn service() -> InventoryService {
        let store = Arc::new(MemoryStore::new());
        InventoryService::new(
            Repository::new(store.clone()),
            Repository::new(store),
            EventBus::default(),
        )
    }

    fn novo(nome: &str, estoque: i64, minimo: i64) -> NovoProduto {
        NovoProduto {
            nome_produto: nome.into(),
            descricao: None,
            sku: Some(format!("SKU-{}", nome.to_uppercase())),
            codigo_barras: None,
            categoria: None,
            unidade: "un".into(),
            preco_venda: dec!(10.00),
            preco_custo: None,
            quantidade_estoque: estoque,
            estoque_minimo: minimo,
            status: ProdutoStatus::Ativo,
        }
    }

    #[rstest]
    #[case(10, TipoMovimentacao::Entrada, 5, 15)]
    #[case(10, TipoMovimentacao::Saida, 4, 6)]
    #[case(2, TipoMovimentacao::Saida, 5, -3)]
    #[case(10, TipoMovimentacao::Ajuste, 7, 7)]
    fn balance_after_movement(
        #[case] atual: i64,
        #[case] tipo: TipoMovimentacao,
        #[case] quantidade: i64,
        #[case] esperado: i64,
    ) {
        assert_eq!(saldo_apos(atual, tipo, quantidade), esperado);
    }

    #[tokio::test]
    async fn sale_decrement_can_go_negative_and_is_logged() {
        let service = service();
        let produto = service.criar("ana@loja.com", &novo("caneta", 2, 0)).await.unwrap();
        let venda_id = Uuid::new_v4();

        let baixa = service
            .baixar_estoque("ana@loja.com", produto.id, 5, venda_id)
            .await
            .unwrap();
        assert_eq!(baixa.produto.quantidade_estoque, -3);
        let produto = service.registrar_saida("ana@loja.com", baixa).await.unwrap();

        let movs = service.movimentacoes("ana@loja.com", produto.id).await.unwrap();
        assert_eq!(movs.len(), 2);
        let saida = movs.iter().find(|m| m.tipo == TipoMovimentacao::Saida).unwrap();
        assert_eq!((saida.saldo_anterior, saida.saldo_atual), (2, -3));
        assert_eq!(saida.venda_id, Some(venda_id));
    }

    #[tokio::test]
    async fn stock_event_is_published_before_the_movement_is_written() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let service = InventoryService::new(Repository::new(store.clone()), Repository::new(store), bus.clone());
        let produto = service.criar("ana@loja.com", &novo("caneta", 3, 0)).await.unwrap();

        let mut rx = bus.subscribe();
        let _baixa = service
            .baixar_estoque("ana@loja.com", produto.id, 1, Uuid::new_v4())
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            DomainEvent::StockDecremented { produto_id, quantidade, .. } => {
                assert_eq!(produto_id, produto.id);
                assert_eq!(quantidade, 1);
            }
            other => panic!("evento inesperado: {:?}", other),
        }
    }

    #[tokio::test]
    async fn low_stock_lists_only_products_at_or_below_minimum() {
        let service = service();
        service.criar("ana@loja.com", &novo("caneta", 2, 5)).await.unwrap();
        service.criar("ana@loja.com", &novo("caderno", 50, 5)).await.unwrap();
        service.criar("ana@loja.com", &novo("lapis", 5, 5)).await.unwrap();

        let baixos = service.estoque_baixo("ana@loja.com").await.unwrap();
        let nomes: Vec<&str> = baixos.iter().map(|p| p.nome_produto.as_str()).collect();
        assert_eq!(nomes, vec!["caneta", "lapis"]);
    }

    #[tokio::test]
    async fn search_matches_name_or_sku() {
        let service = service();
        service.criar("ana@loja.com", &novo("caneta", 1, 0)).await.unwrap();
        service.criar("ana@loja.com", &novo("caderno", 1, 0)).await.unwrap();

        let query = ProdutosQuery { busca: Some("sku-cad".into()), status: None };
        let achados = service.listar("ana@loja.com", &query).await.unwrap();
        assert_eq!(achados.len(), 1);
        assert_eq!(achados[0].nome_produto, "caderno");
    }
}
