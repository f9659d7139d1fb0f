// src/services/document_service.rs

use chrono::{NaiveDate, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::{
        billing::{Parcela, ParcelaStatus},
        crm::Cliente,
        documents::{
            EmitirNotaPayload, EmitirReciboPayload, ItemNota, NotaServico, NovaNota, NovoRecibo,
            Recibo,
        },
        sales::Venda,
        settings::Configuracao,
    },
    services::settings_service::SettingsService,
};

const FORMA_PAGAMENTO_PADRAO: &str = "Dinheiro";

pub fn numero_nota() -> String {
    format!("NF{}", Utc::now().timestamp_millis())
}

pub fn numero_recibo() -> String {
    format!("REC{}", Utc::now().timestamp_millis())
}

/// Itens da nota: os informados ou, sem eles, os da venda.
pub fn itens_da_nota(payload: &EmitirNotaPayload, venda: &Venda) -> Vec<ItemNota> {
    if payload.itens.is_empty() {
        return venda
            .itens
            .iter()
            .map(|item| ItemNota {
                descricao: item.produto_nome.clone(),
                quantidade: Decimal::from(item.quantidade),
                valor_unitario: item.preco_unitario,
                valor_total: item.subtotal,
            })
            .collect();
    }
    payload
        .itens
        .iter()
        .map(|item| ItemNota {
            descricao: item.descricao.trim().to_string(),
            quantidade: item.quantidade,
            valor_unitario: item.valor_unitario,
            valor_total: item.quantidade * item.valor_unitario,
        })
        .collect()
}

pub fn referente_a_parcela(parcela: &Parcela) -> String {
    format!(
        "Pagamento da parcela {} da venda #{}",
        parcela.numero_parcela, parcela.numero_venda
    )
}

fn render_err(e: impl std::fmt::Display) -> AppError {
    AppError::DocumentRender(e.to_string())
}

#[derive(Clone)]
pub struct DocumentService {
    notas: Repository<NotaServico>,
    recibos: Repository<Recibo>,
    vendas: Repository<Venda>,
    parcelas: Repository<Parcela>,
    clientes: Repository<Cliente>,
    settings: SettingsService,
    events: EventBus,
    fonts_dir: String,
}

impl DocumentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        notas: Repository<NotaServico>,
        recibos: Repository<Recibo>,
        vendas: Repository<Venda>,
        parcelas: Repository<Parcela>,
        clientes: Repository<Cliente>,
        settings: SettingsService,
        events: EventBus,
        fonts_dir: String,
    ) -> Self {
        Self { notas, recibos, vendas, parcelas, clientes, settings, events, fonts_dir }
    }

    // =========================================================================
    //  NOTAS DE SERVIÇO
    // =========================================================================

    pub async fn listar_notas(&self, owner: &str) -> Result<Vec<NotaServico>, AppError> {
        self.notas
            .list_owned(owner, Some(&SortSpec::desc("created_date")), Page::default())
            .await
    }

    pub async fn emitir_nota(
        &self,
        owner: &str,
        payload: EmitirNotaPayload,
        hoje: NaiveDate,
    ) -> Result<NotaServico, AppError> {
        let venda_id = payload
            .venda_id
            .ok_or(AppError::BusinessRule("nota.venda_obrigatoria"))?;
        let venda = self.vendas.find_owned(owner, venda_id).await?;

        let itens = itens_da_nota(&payload, &venda);
        if itens.is_empty() {
            return Err(AppError::BusinessRule("nota.sem_itens"));
        }

        // CPF e endereço vêm do cadastro, se o cliente ainda existir
        let cliente = self.clientes.get(venda.cliente_id).await?;

        let nova = NovaNota {
            numero_nota: numero_nota(),
            venda_id: Some(venda.id),
            cliente_id: Some(venda.cliente_id),
            cliente_nome: venda.cliente_nome.clone(),
            cliente_cpf_cnpj: cliente.as_ref().and_then(|c| c.cpf_cnpj.clone()),
            cliente_endereco: cliente.as_ref().and_then(|c| c.endereco.clone()),
            data_emissao: hoje,
            valor_total: itens.iter().map(|i| i.valor_total).sum(),
            itens,
            observacoes: payload.observacoes,
        };
        let nota = self.notas.create(owner, &nova).await?;

        tracing::info!("🧾 Nota {} emitida para a venda #{}", nota.numero_nota, venda.numero_venda);
        self.events.publish(DomainEvent::DocumentIssued {
            owner: owner.to_string(),
            documento_id: nota.id,
        });
        Ok(nota)
    }

    pub async fn pdf_nota(&self, owner: &str, nota_id: Uuid) -> Result<Vec<u8>, AppError> {
        let nota = self.notas.find_owned(owner, nota_id).await?;
        let config = self.settings.obter(owner).await?;
        render_nota(&self.fonts_dir, &nota, config.as_ref())
    }

    // =========================================================================
    //  RECIBOS
    // =========================================================================

    pub async fn listar_recibos(&self, owner: &str) -> Result<Vec<Recibo>, AppError> {
        self.recibos
            .list_owned(owner, Some(&SortSpec::desc("created_date")), Page::default())
            .await
    }

    pub async fn emitir_recibo(
        &self,
        owner: &str,
        payload: EmitirReciboPayload,
        hoje: NaiveDate,
    ) -> Result<Recibo, AppError> {
        let parcela_id = payload
            .parcela_id
            .ok_or(AppError::BusinessRule("recibo.parcela_nao_paga"))?;
        let parcela = self.parcelas.find_owned(owner, parcela_id).await?;
        if parcela.status != ParcelaStatus::Pago {
            return Err(AppError::BusinessRule("recibo.parcela_nao_paga"));
        }

        let cliente = self.clientes.get(parcela.cliente_id).await?;

        let novo = NovoRecibo {
            numero_recibo: numero_recibo(),
            venda_id: Some(parcela.venda_id),
            parcela_id: Some(parcela.id),
            cliente_id: Some(parcela.cliente_id),
            cliente_nome: parcela.cliente_nome.clone(),
            cliente_cpf_cnpj: cliente.and_then(|c| c.cpf_cnpj),
            data_pagamento: payload
                .data_pagamento
                .or(parcela.data_pagamento)
                .unwrap_or(hoje),
            valor_pago: payload.valor_pago.unwrap_or(parcela.valor),
            forma_pagamento: payload
                .forma_pagamento
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| FORMA_PAGAMENTO_PADRAO.to_string()),
            referente_a: payload
                .referente_a
                .unwrap_or_else(|| referente_a_parcela(&parcela)),
            observacoes: payload.observacoes,
        };
        let recibo = self.recibos.create(owner, &novo).await?;

        tracing::info!("🧾 Recibo {} emitido ({})", recibo.numero_recibo, recibo.referente_a);
        self.events.publish(DomainEvent::DocumentIssued {
            owner: owner.to_string(),
            documento_id: recibo.id,
        });
        Ok(recibo)
    }

    pub async fn pdf_recibo(&self, owner: &str, recibo_id: Uuid) -> Result<Vec<u8>, AppError> {
        let recibo = self.recibos.find_owned(owner, recibo_id).await?;
        let config = self.settings.obter(owner).await?;
        render_recibo(&self.fonts_dir, &recibo, config.as_ref())
    }
}

// =============================================================================
//  PDF (genpdf)
// =============================================================================

fn novo_documento(
    fonts_dir: &str,
    titulo: &str,
    config: Option<&Configuracao>,
) -> Result<genpdf::Document, AppError> {
    // Carrega a fonte da pasta configurada (FONTS_DIR)
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(format!("Fonte não encontrada na pasta {}", fonts_dir)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(titulo);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO DA EMPRESA ---
    let nome = config
        .and_then(|c| c.nome_empresa.clone())
        .unwrap_or_else(|| "GESTÃO PRO".to_string());
    doc.push(elements::Paragraph::new(nome).styled(style::Style::new().bold().with_font_size(18)));

    if let Some(cnpj) = config.and_then(|c| c.cnpj.as_deref()) {
        doc.push(
            elements::Paragraph::new(format!("CNPJ: {}", cnpj))
                .styled(style::Style::new().with_font_size(10)),
        );
    }
    if let Some(endereco) = config.and_then(|c| c.endereco.as_deref()) {
        doc.push(
            elements::Paragraph::new(endereco.to_string())
                .styled(style::Style::new().with_font_size(10)),
        );
    }

    doc.push(elements::Break::new(1.5));
    doc.push(
        elements::Paragraph::new(titulo.to_string())
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    Ok(doc)
}

// QR Code com a chave PIX da empresa, quando houver
fn push_pix(doc: &mut genpdf::Document, config: Option<&Configuracao>) -> Result<(), AppError> {
    let Some(chave) = config.and_then(|c| c.chave_pix.as_deref()) else {
        return Ok(());
    };

    doc.push(elements::Break::new(2));
    doc.push(
        elements::Paragraph::new("PAGAMENTO VIA PIX")
            .styled(style::Style::new().bold().with_font_size(12)),
    );
    doc.push(elements::Paragraph::new(format!("Chave: {}", chave)));
    doc.push(elements::Break::new(1));

    let code = QrCode::new(chave.as_bytes()).map_err(render_err)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

    let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
        .map_err(render_err)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(pdf_image);
    Ok(())
}

fn finalizar(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(render_err)?;
    Ok(buffer)
}

pub fn render_nota(
    fonts_dir: &str,
    nota: &NotaServico,
    config: Option<&Configuracao>,
) -> Result<Vec<u8>, AppError> {
    let mut doc = novo_documento(fonts_dir, &format!("NOTA DE SERVIÇO {}", nota.numero_nota), config)?;

    doc.push(elements::Paragraph::new(format!("Data: {}", nota.data_emissao.format("%d/%m/%Y"))));
    doc.push(elements::Paragraph::new(format!("Cliente: {}", nota.cliente_nome)));
    if let Some(doc_cliente) = &nota.cliente_cpf_cnpj {
        doc.push(elements::Paragraph::new(format!("CPF/CNPJ: {}", doc_cliente)));
    }
    if let Some(endereco) = &nota.cliente_endereco {
        doc.push(elements::Paragraph::new(format!("Endereço: {}", endereco)));
    }
    doc.push(elements::Break::new(2));

    // Pesos das colunas: Descrição (4), Qtd (1), Unitário (2), Total (2)
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Descrição").styled(bold))
        .element(elements::Paragraph::new("Qtd").styled(bold))
        .element(elements::Paragraph::new("Unitário").styled(bold))
        .element(elements::Paragraph::new("Total").styled(bold))
        .push()
        .map_err(render_err)?;

    for item in &nota.itens {
        table
            .row()
            .element(elements::Paragraph::new(item.descricao.clone()))
            .element(elements::Paragraph::new(format!("{}", item.quantidade.normalize())))
            .element(elements::Paragraph::new(format!("R$ {:.2}", item.valor_unitario)))
            .element(elements::Paragraph::new(format!("R$ {:.2}", item.valor_total)))
            .push()
            .map_err(render_err)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(2));

    let mut total = elements::Paragraph::new(format!("TOTAL: R$ {:.2}", nota.valor_total));
    total.set_alignment(genpdf::Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

    if let Some(obs) = &nota.observacoes {
        doc.push(elements::Break::new(1));
        doc.push(elements::Paragraph::new(obs.clone()).styled(style::Style::new().italic().with_font_size(9)));
    }

    push_pix(&mut doc, config)?;
    finalizar(doc)
}

pub fn render_recibo(
    fonts_dir: &str,
    recibo: &Recibo,
    config: Option<&Configuracao>,
) -> Result<Vec<u8>, AppError> {
    let mut doc = novo_documento(fonts_dir, &format!("RECIBO {}", recibo.numero_recibo), config)?;

    let emitente = config
        .and_then(|c| c.nome_empresa.clone())
        .unwrap_or_else(|| "a empresa".to_string());
    doc.push(elements::Paragraph::new(format!(
        "Recebi(emos) de {} a importância de R$ {:.2}, referente a: {}.",
        recibo.cliente_nome, recibo.valor_pago, recibo.referente_a
    )));
    doc.push(elements::Break::new(1));
    doc.push(elements::Paragraph::new(format!("Forma de pagamento: {}", recibo.forma_pagamento)));
    doc.push(elements::Paragraph::new(format!(
        "Data do pagamento: {}",
        recibo.data_pagamento.format("%d/%m/%Y")
    )));
    if let Some(doc_cliente) = &recibo.cliente_cpf_cnpj {
        doc.push(elements::Paragraph::new(format!("CPF/CNPJ do pagador: {}", doc_cliente)));
    }
    if let Some(obs) = &recibo.observacoes {
        doc.push(elements::Paragraph::new(format!("Observações: {}", obs)));
    }

    doc.push(elements::Break::new(3));
    for linha in ["_______________________________".to_string(), emitente] {
        let mut assinatura = elements::Paragraph::new(linha);
        assinatura.set_alignment(genpdf::Alignment::Center);
        doc.push(assinatura);
    }

    finalizar(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            billing::{ClienteRef, NovaParcela},
            documents::ItemNotaPayload,
            sales::{FormaPagamento, ItemVenda, VendaStatus},
        },
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;

    const OWNER: &str = "ana@loja.com";

    fn hoje() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn service(store: Arc<MemoryStore>) -> DocumentService {
        DocumentService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            SettingsService::new(Repository::new(store.clone()), Repository::new(store)),
            EventBus::default(),
            "./nao-existe".to_string(),
        )
    }

    async fn venda(store: &Arc<MemoryStore>) -> Venda {
        Repository::<Venda>::new(store.clone())
            .create(
                OWNER,
                &json!({
                    "numero_venda": 7,
                    "cliente_id": Uuid::new_v4(),
                    "cliente_nome": "Maria Souza",
                    "itens": [ItemVenda {
                        produto_id: Uuid::new_v4(),
                        produto_nome: "Caneta".into(),
                        quantidade: 3,
                        preco_unitario: dec!(2.50),
                        subtotal: dec!(7.50),
                    }],
                    "valor_total": 7.5,
                    "forma_pagamento": FormaPagamento::Pix,
                    "status": VendaStatus::Pendente,
                    "data_venda": "2024-03-01",
                }),
            )
            .await
            .unwrap()
    }

    async fn parcela(store: &Arc<MemoryStore>, status: ParcelaStatus) -> Parcela {
        let repo = Repository::<Parcela>::new(store.clone());
        let nova = NovaParcela {
            cliente: ClienteRef {
                cliente_id: Uuid::new_v4(),
                cliente_nome: "Maria Souza".into(),
                cliente_telefone: None,
            },
            venda_id: Some(Uuid::new_v4()),
            numero_venda: Some(7),
            numero_parcela: 2,
            total_parcelas: 3,
            valor: dec!(100.00),
            data_vencimento: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
            data_pagamento: (status == ParcelaStatus::Pago).then(|| NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
        };
        repo.create(OWNER, &nova).await.unwrap()
    }

    #[tokio::test]
    async fn note_copies_sale_items_when_none_given() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let venda = venda(&store).await;

        let payload = EmitirNotaPayload { venda_id: Some(venda.id), ..Default::default() };
        let nota = service.emitir_nota(OWNER, payload, hoje()).await.unwrap();

        assert!(nota.numero_nota.starts_with("NF"));
        assert_eq!(nota.itens.len(), 1);
        assert_eq!(nota.itens[0].descricao, "Caneta");
        assert_eq!(nota.valor_total, dec!(7.50));
        assert_eq!(nota.data_emissao, hoje());
    }

    #[tokio::test]
    async fn note_with_explicit_items_totals_them() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let venda = venda(&store).await;

        let payload = EmitirNotaPayload {
            venda_id: Some(venda.id),
            itens: vec![ItemNotaPayload {
                descricao: "Instalação".into(),
                quantidade: dec!(2),
                valor_unitario: dec!(40.00),
            }],
            observacoes: None,
        };
        let nota = service.emitir_nota(OWNER, payload, hoje()).await.unwrap();
        assert_eq!(nota.valor_total, dec!(80.00));
    }

    #[tokio::test]
    async fn note_requires_a_sale() {
        let service = service(Arc::new(MemoryStore::new()));
        let err = service.emitir_nota(OWNER, EmitirNotaPayload::default(), hoje()).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("nota.venda_obrigatoria")));
    }

    #[tokio::test]
    async fn receipt_only_for_paid_installments() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());

        let aberta = parcela(&store, ParcelaStatus::Pendente).await;
        let payload = EmitirReciboPayload { parcela_id: Some(aberta.id), ..Default::default() };
        let err = service.emitir_recibo(OWNER, payload, hoje()).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("recibo.parcela_nao_paga")));

        let paga = parcela(&store, ParcelaStatus::Pago).await;
        let payload = EmitirReciboPayload { parcela_id: Some(paga.id), ..Default::default() };
        let recibo = service.emitir_recibo(OWNER, payload, hoje()).await.unwrap();

        assert!(recibo.numero_recibo.starts_with("REC"));
        assert_eq!(recibo.valor_pago, dec!(100.00));
        assert_eq!(recibo.data_pagamento, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(recibo.forma_pagamento, "Dinheiro");
        assert_eq!(recibo.referente_a, "Pagamento da parcela 2 da venda #7");
    }

    #[tokio::test]
    async fn pdf_without_fonts_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let venda = venda(&store).await;
        let nota = service
            .emitir_nota(OWNER, EmitirNotaPayload { venda_id: Some(venda.id), ..Default::default() }, hoje())
            .await
            .unwrap();

        let err = service.pdf_nota(OWNER, nota.id).await.unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
