// src/services/cart.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        billing::{ClienteRef, NovaParcela},
        crm::Cliente,
        inventory::Produto,
        sales::{CarrinhoResumo, FormaPagamento, ItemVenda, LinhaCarrinho, NovaVenda},
    },
    services::installment_plan::{gerar_parcelas, MAX_PARCELAS},
};

/// Carrinho de uma venda em montagem.
///
/// Vive só durante a requisição: é montado a partir do payload, validado e
/// convertido em `NovaVenda`. Nenhuma chamada ao entity store acontece aqui.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    cliente: Option<ClienteRef>,
    linhas: Vec<LinhaCarrinho>,
    forma_pagamento: FormaPagamento,
    quantidade_parcelas: Option<u32>,
    observacoes: Option<String>,
}

impl SaleDraft {
    pub fn new(forma_pagamento: FormaPagamento) -> Self {
        Self {
            cliente: None,
            linhas: Vec::new(),
            forma_pagamento,
            quantidade_parcelas: None,
            observacoes: None,
        }
    }

    pub fn select_client(&mut self, cliente: &Cliente) {
        self.cliente = Some(ClienteRef {
            cliente_id: cliente.id,
            cliente_nome: cliente.nome_completo.clone(),
            cliente_telefone: cliente.telefone.clone(),
        });
    }

    pub fn set_payment(&mut self, forma: FormaPagamento, quantidade_parcelas: Option<u32>) -> Result<(), AppError> {
        if forma == FormaPagamento::Crediario && quantidade_parcelas.is_some_and(|n| n > MAX_PARCELAS) {
            return Err(AppError::BusinessRule("venda.parcelas_limite"));
        }
        self.forma_pagamento = forma;
        self.quantidade_parcelas = quantidade_parcelas;
        Ok(())
    }

    pub fn set_notes(&mut self, observacoes: Option<String>) {
        self.observacoes = observacoes.filter(|o| !o.trim().is_empty());
    }

    /// Adiciona um produto. Se já estiver no carrinho, soma as quantidades.
    /// O total da linha não pode passar do estoque disponível.
    pub fn add_product(&mut self, produto: &Produto, quantidade: i64) -> Result<(), AppError> {
        if quantidade <= 0 {
            return Err(AppError::BusinessRule("venda.item_invalido"));
        }

        match self.linhas.iter_mut().find(|l| l.produto_id == produto.id) {
            Some(linha) => {
                let nova = linha.quantidade + quantidade;
                if nova > linha.estoque_disponivel {
                    return Err(AppError::BusinessRule("venda.estoque_maximo"));
                }
                linha.quantidade = nova;
                linha.subtotal = linha.preco_unitario * Decimal::from(nova);
            }
            None => {
                if quantidade > produto.quantidade_estoque {
                    return Err(AppError::BusinessRule("venda.estoque_maximo"));
                }
                self.linhas.push(LinhaCarrinho {
                    produto_id: produto.id,
                    produto_nome: produto.nome_produto.clone(),
                    quantidade,
                    preco_unitario: produto.preco_venda,
                    subtotal: produto.preco_venda * Decimal::from(quantidade),
                    estoque_disponivel: produto.quantidade_estoque,
                });
            }
        }
        Ok(())
    }

    /// Leitura de código de barras: acha o produto no catálogo e adiciona 1 unidade.
    pub fn add_by_barcode(&mut self, catalogo: &[Produto], codigo: &str) -> Result<(), AppError> {
        let produto = find_by_barcode(catalogo, codigo)
            .ok_or(AppError::BusinessRule("venda.produto_inexistente"))?;
        self.add_product(produto, 1)
    }

    /// Quantidade zero ou negativa tira o item do carrinho.
    pub fn set_quantity(&mut self, produto_id: Uuid, quantidade: i64) -> Result<(), AppError> {
        if quantidade <= 0 {
            self.remove(produto_id);
            return Ok(());
        }
        let linha = self
            .linhas
            .iter_mut()
            .find(|l| l.produto_id == produto_id)
            .ok_or(AppError::BusinessRule("venda.produto_inexistente"))?;
        if quantidade > linha.estoque_disponivel {
            return Err(AppError::BusinessRule("venda.estoque_maximo"));
        }
        linha.quantidade = quantidade;
        linha.subtotal = linha.preco_unitario * Decimal::from(quantidade);
        Ok(())
    }

    pub fn remove(&mut self, produto_id: Uuid) {
        self.linhas.retain(|l| l.produto_id != produto_id);
    }

    pub fn lines(&self) -> &[LinhaCarrinho] {
        &self.linhas
    }

    pub fn total(&self) -> Decimal {
        self.linhas.iter().map(|l| l.subtotal).sum()
    }

    fn parcelas_efetivas(&self) -> Option<u32> {
        match self.forma_pagamento {
            FormaPagamento::Crediario => self.quantidade_parcelas,
            _ => None,
        }
    }

    /// Prévia para a tela: linhas, total e, no crediário, o plano de parcelas.
    pub fn summary(&self, data_venda: NaiveDate) -> CarrinhoResumo {
        let parcelas: Vec<NovaParcela> = match (&self.cliente, self.parcelas_efetivas()) {
            (Some(cliente), Some(n)) => gerar_parcelas(self.total(), n, data_venda, cliente),
            _ => Vec::new(),
        };
        CarrinhoResumo {
            itens: self.linhas.clone(),
            valor_total: self.total(),
            quantidade_itens: self.linhas.iter().map(|l| l.quantidade).sum(),
            parcelas,
        }
    }

    /// Validação local, na ordem em que a tela avisa o usuário.
    pub fn validate(self, data_venda: NaiveDate) -> Result<NovaVenda, AppError> {
        let cliente = self
            .cliente
            .clone()
            .ok_or(AppError::BusinessRule("venda.cliente_obrigatorio"))?;

        if self.linhas.is_empty() {
            return Err(AppError::BusinessRule("venda.carrinho_vazio"));
        }
        if self.linhas.iter().any(|l| l.quantidade <= 0) {
            return Err(AppError::BusinessRule("venda.item_invalido"));
        }

        let quantidade_parcelas = self.parcelas_efetivas();
        if self.forma_pagamento == FormaPagamento::Crediario
            && quantidade_parcelas.unwrap_or(0) == 0
        {
            return Err(AppError::BusinessRule("venda.parcelas_obrigatorias"));
        }

        let valor_total = self.total();
        let itens = self
            .linhas
            .into_iter()
            .map(|l| ItemVenda {
                produto_id: l.produto_id,
                produto_nome: l.produto_nome,
                quantidade: l.quantidade,
                preco_unitario: l.preco_unitario,
                subtotal: l.subtotal,
            })
            .collect();

        Ok(NovaVenda {
            cliente_id: cliente.cliente_id,
            cliente_nome: cliente.cliente_nome,
            cliente_telefone: cliente.cliente_telefone,
            itens,
            valor_total,
            forma_pagamento: self.forma_pagamento,
            quantidade_parcelas,
            observacoes: self.observacoes,
            data_venda,
        })
    }
}

pub fn find_by_barcode<'a>(catalogo: &'a [Produto], codigo: &str) -> Option<&'a Produto> {
    let codigo = codigo.trim();
    catalogo
        .iter()
        .find(|p| p.codigo_barras.as_deref().map(str::trim) == Some(codigo))
}
