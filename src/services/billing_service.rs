// src/services/billing_service.rs

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::billing::{
        BaixaParcela, Cobranca, CobrancasQuery, FiltroCobranca, PAGINA_MAXIMA, LembreteWhatsApp, PaginaCobrancas,
        PagarParcelaPayload, Parcela, ParcelaStatus, ResumoCobrancas, StatusDerivado,
        TotalizadorCobranca,
    },
    read_models::{Leitura, ReadModels},
};

pub const TAMANHO_PAGINA: i64 = 10;

// =============================================================================
//  CLASSIFICAÇÃO (funções puras)
// =============================================================================

/// Status de exibição de uma parcela em relação a `hoje`.
/// Vencer hoje ainda não é atraso.
pub fn classificar(
    status: ParcelaStatus,
    vencimento: NaiveDate,
    hoje: NaiveDate,
) -> (StatusDerivado, Option<i64>) {
    match status {
        ParcelaStatus::Pago => (StatusDerivado::Pago, None),
        ParcelaStatus::Pendente if vencimento < hoje => {
            (StatusDerivado::Atrasado, Some((hoje - vencimento).num_days()))
        }
        ParcelaStatus::Pendente => (StatusDerivado::Pendente, None),
    }
}

pub fn anotar(parcela: Parcela, hoje: NaiveDate) -> Cobranca {
    let (status_derivado, dias_atraso) = classificar(parcela.status, parcela.data_vencimento, hoje);
    Cobranca { parcela, status_derivado, dias_atraso }
}

/// Atrasadas, depois pendentes, depois pagas; empate pelo vencimento mais antigo.
pub fn ordenar(cobrancas: &mut [Cobranca]) {
    cobrancas.sort_by_key(|c| (c.status_derivado, c.parcela.data_vencimento));
}

/// Predicado do entity store para um filtro da tela de cobranças.
pub fn filtro_cobranca(owner: &str, filtro: FiltroCobranca, busca: Option<&str>, hoje: NaiveDate) -> Filter {
    let hoje_str = hoje.to_string();
    let pendente = || Filter::eq("status", "pendente");

    let por_status = match filtro {
        FiltroCobranca::Todos => Filter::All,
        FiltroCobranca::Atrasado => pendente().and(Filter::lt("data_vencimento", hoje_str)),
        FiltroCobranca::Hoje => pendente().and(Filter::eq("data_vencimento", hoje_str)),
        FiltroCobranca::Pendente => pendente().and(Filter::gt("data_vencimento", hoje_str)),
        FiltroCobranca::Pagas => Filter::eq("status", "pago"),
    };

    let mut filtro = owned_by(owner).and(por_status);
    if let Some(termo) = busca.map(str::trim).filter(|t| !t.is_empty()) {
        filtro = filtro.and(Filter::Or(vec![
            Filter::contains("cliente_nome", termo),
            Filter::contains("numero_venda", termo),
        ]));
    }
    filtro
}

pub fn resumir(parcelas: &[Parcela], hoje: NaiveDate) -> ResumoCobrancas {
    let mut resumo = ResumoCobrancas::default();
    for parcela in parcelas.iter().filter(|p| p.status == ParcelaStatus::Pendente) {
        somar(&mut resumo.pendentes, parcela.valor);
        if parcela.data_vencimento < hoje {
            somar(&mut resumo.atrasadas, parcela.valor);
        } else if parcela.data_vencimento == hoje {
            somar(&mut resumo.vencem_hoje, parcela.valor);
        }
    }
    resumo
}

fn somar(totalizador: &mut TotalizadorCobranca, valor: Decimal) {
    totalizador.quantidade += 1;
    totalizador.total += valor;
}

// =============================================================================
//  LEMBRETE DE WHATSAPP
// =============================================================================

const MESES: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

fn data_por_extenso(data: NaiveDate) -> String {
    format!("{:02} de {} de {}", data.day(), MESES[data.month0() as usize], data.year())
}

pub fn mensagem_lembrete(cobranca: &Cobranca) -> String {
    let p = &cobranca.parcela;
    let atraso = match (cobranca.status_derivado, cobranca.dias_atraso) {
        (StatusDerivado::Atrasado, Some(dias)) => {
            format!("⚠️ Esta parcela está *{} dias atrasada*.", dias)
        }
        _ => String::new(),
    };

    format!(
        "Olá {}! \n\nLembramos que você tem uma parcela no valor de *R$ {:.2}* da venda #{} \
         que vence em {}.\n\n{}\n\nPor favor, entre em contato para regularizar o pagamento.\n\nObrigado!",
        p.cliente_nome,
        p.valor,
        p.numero_venda,
        data_por_extenso(p.data_vencimento),
        atraso
    )
}

/// Monta o link `wa.me` com a mensagem. Telefone sem dígitos não gera link.
pub fn lembrete_whatsapp(cobranca: &Cobranca) -> Result<LembreteWhatsApp, AppError> {
    let telefone: String = cobranca
        .parcela
        .cliente_telefone
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if telefone.is_empty() {
        return Err(AppError::BusinessRule("cobranca.sem_telefone"));
    }

    let mensagem = mensagem_lembrete(cobranca);
    // form_urlencoded usa '+' para espaço; o WhatsApp espera %20
    let texto: String = url::form_urlencoded::byte_serialize(mensagem.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    Ok(LembreteWhatsApp {
        url: format!("https://wa.me/55{}?text={}", telefone, texto),
        mensagem,
    })
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct BillingService {
    parcelas: Repository<Parcela>,
    events: EventBus,
    read_models: Arc<ReadModels>,
}

impl BillingService {
    pub fn new(parcelas: Repository<Parcela>, events: EventBus, read_models: Arc<ReadModels>) -> Self {
        Self { parcelas, events, read_models }
    }

    /// Uma página da tela de cobranças, já anotada e reordenada.
    pub async fn listar(
        &self,
        owner: &str,
        query: &CobrancasQuery,
        hoje: NaiveDate,
    ) -> Result<PaginaCobrancas, AppError> {
        let filtro = filtro_cobranca(owner, query.filtro, query.busca.as_deref(), hoje);
        let pagina = query.pagina.unwrap_or(1).clamp(1, PAGINA_MAXIMA);

        let total = self.parcelas.count(&filtro).await?;
        let parcelas = self
            .parcelas
            .filter(
                &filtro,
                Some(&SortSpec::asc("data_vencimento")),
                Page::new(TAMANHO_PAGINA, (pagina - 1) * TAMANHO_PAGINA),
            )
            .await?;

        let mut itens: Vec<Cobranca> = parcelas.into_iter().map(|p| anotar(p, hoje)).collect();
        ordenar(&mut itens);

        Ok(PaginaCobrancas {
            itens,
            pagina,
            total,
            total_paginas: (total + TAMANHO_PAGINA - 1) / TAMANHO_PAGINA,
        })
    }

    pub async fn resumo(&self, owner: &str, hoje: NaiveDate) -> Result<ResumoCobrancas, AppError> {
        let geracao = match self.read_models.billing_summary(owner, hoje).await {
            Leitura::Cache(resumo) => return Ok(resumo),
            Leitura::Calcular(geracao) => geracao,
        };

        let abertas = self
            .parcelas
            .filter(
                &owned_by(owner).and(Filter::eq("status", "pendente")),
                None,
                Page::default(),
            )
            .await?;

        let resumo = resumir(&abertas, hoje);
        self.read_models
            .store_billing_summary(owner, hoje, geracao, resumo.clone())
            .await;
        Ok(resumo)
    }

    /// Baixa manual de uma parcela.
    pub async fn pagar(
        &self,
        owner: &str,
        parcela_id: Uuid,
        payload: PagarParcelaPayload,
        hoje: NaiveDate,
    ) -> Result<Cobranca, AppError> {
        let parcela = self.parcelas.find_owned(owner, parcela_id).await?;
        if parcela.status == ParcelaStatus::Pago {
            return Err(AppError::BusinessRule("cobranca.ja_paga"));
        }

        let baixa = BaixaParcela {
            status: ParcelaStatus::Pago,
            data_pagamento: payload.data_pagamento.unwrap_or(hoje),
            observacoes: payload.observacoes,
        };
        let parcela = self.parcelas.update(parcela_id, &baixa).await?;

        tracing::info!(
            "💰 Parcela {}/{} da venda #{} paga",
            parcela.numero_parcela, parcela.total_parcelas, parcela.numero_venda
        );
        self.events.publish(DomainEvent::InstallmentPaid {
            owner: owner.to_string(),
            parcela_id,
        });

        Ok(anotar(parcela, hoje))
    }

    pub async fn lembrete(
        &self,
        owner: &str,
        parcela_id: Uuid,
        hoje: NaiveDate,
    ) -> Result<LembreteWhatsApp, AppError> {
        let parcela = self.parcelas.find_owned(owner, parcela_id).await?;
        lembrete_whatsapp(&anotar(parcela, hoje))
    }

    pub async fn do_cliente(
        &self,
        owner: &str,
        cliente_id: Uuid,
        hoje: NaiveDate,
    ) -> Result<Vec<Cobranca>, AppError> {
        let filtro = owned_by(owner).and(Filter::eq("cliente_id", cliente_id.to_string()));
        let mut cobrancas: Vec<Cobranca> = self
            .parcelas
            .filter(&filtro, Some(&SortSpec::asc("data_vencimento")), Page::default())
            .await?
            .into_iter()
            .map(|p| anotar(p, hoje))
            .collect();
        ordenar(&mut cobrancas);
        Ok(cobrancas)
    }

    pub async fn atrasadas(&self, owner: &str, hoje: NaiveDate) -> Result<Vec<Cobranca>, AppError> {
        let filtro = filtro_cobranca(owner, FiltroCobranca::Atrasado, None, hoje);
        Ok(self
            .parcelas
            .filter(&filtro, Some(&SortSpec::asc("data_vencimento")), Page::default())
            .await?
            .into_iter()
            .map(|p| anotar(p, hoje))
            .collect())
    }
}
