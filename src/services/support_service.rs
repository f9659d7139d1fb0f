// src/services/support_service.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, Page, Repository, SortSpec},
    models::{
        auth::Usuario,
        support::{
            AbrirConversaPayload, AbrirTicketPayload, ChatConversa, ChatMessage, ConversaAberta,
            ConversaStatus, EnviarMensagemPayload, NovaConversa, NovaMensagem, NovoTicket,
            Remetente, ResolverTicketPayload, SuporteTicket, TicketStatus,
        },
    },
};

#[derive(Serialize)]
struct UltimaMensagem<'a> {
    ultima_mensagem: &'a str,
    data_ultima_mensagem: DateTime<Utc>,
}

#[derive(Serialize)]
struct FecharConversa {
    status: ConversaStatus,
}

#[derive(Serialize)]
struct ResolucaoTicket {
    status: TicketStatus,
    resposta: String,
    data_resolucao: DateTime<Utc>,
}

fn remetente(usuario: &Usuario) -> Remetente {
    if usuario.is_admin() { Remetente::Admin } else { Remetente::Usuario }
}

#[derive(Clone)]
pub struct SupportService {
    conversas: Repository<ChatConversa>,
    mensagens: Repository<ChatMessage>,
    tickets: Repository<SuporteTicket>,
}

impl SupportService {
    pub fn new(
        conversas: Repository<ChatConversa>,
        mensagens: Repository<ChatMessage>,
        tickets: Repository<SuporteTicket>,
    ) -> Self {
        Self { conversas, mensagens, tickets }
    }

    // =========================================================================
    //  CHAT
    // =========================================================================

    /// Cria a conversa já com a primeira mensagem.
    pub async fn abrir_conversa(
        &self,
        usuario: &Usuario,
        payload: AbrirConversaPayload,
    ) -> Result<ConversaAberta, AppError> {
        let agora = Utc::now();
        let conversa = self
            .conversas
            .create(
                &usuario.email,
                &NovaConversa {
                    usuario_id: usuario.id,
                    usuario_email: usuario.email.clone(),
                    usuario_nome: usuario.full_name.clone(),
                    assunto: payload.assunto.trim().to_string(),
                    status: ConversaStatus::Aberta,
                    ultima_mensagem: payload.mensagem.clone(),
                    data_ultima_mensagem: agora,
                },
            )
            .await?;

        let mensagem = self
            .mensagens
            .create(
                &usuario.email,
                &NovaMensagem {
                    conversa_id: conversa.id,
                    remetente: Remetente::Usuario,
                    remetente_email: usuario.email.clone(),
                    conteudo: payload.mensagem,
                },
            )
            .await?;

        tracing::info!("💬 Conversa de suporte aberta por {}: '{}'", usuario.email, conversa.assunto);
        Ok(ConversaAberta { conversa, mensagem })
    }

    // O admin enxerga todas as conversas; o usuário, só as dele
    async fn conversa_acessivel(&self, usuario: &Usuario, conversa_id: Uuid) -> Result<ChatConversa, AppError> {
        if usuario.is_admin() {
            self.conversas.find(conversa_id).await
        } else {
            self.conversas.find_owned(&usuario.email, conversa_id).await
        }
    }

    /// Mensagens da conversa, da mais antiga para a mais nova.
    pub async fn mensagens(&self, usuario: &Usuario, conversa_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        self.conversa_acessivel(usuario, conversa_id).await?;
        self.mensagens
            .filter(
                &Filter::eq("conversa_id", conversa_id.to_string()),
                Some(&SortSpec::asc("created_date")),
                Page::default(),
            )
            .await
    }

    pub async fn enviar_mensagem(
        &self,
        usuario: &Usuario,
        conversa_id: Uuid,
        payload: EnviarMensagemPayload,
    ) -> Result<ChatMessage, AppError> {
        let conversa = self.conversa_acessivel(usuario, conversa_id).await?;
        if conversa.status == ConversaStatus::Fechada {
            return Err(AppError::BusinessRule("suporte.conversa_fechada"));
        }

        let mensagem = self
            .mensagens
            .create(
                &usuario.email,
                &NovaMensagem {
                    conversa_id,
                    remetente: remetente(usuario),
                    remetente_email: usuario.email.clone(),
                    conteudo: payload.conteudo,
                },
            )
            .await?;

        self.conversas
            .update(
                conversa_id,
                &UltimaMensagem {
                    ultima_mensagem: &mensagem.conteudo,
                    data_ultima_mensagem: mensagem.created_date,
                },
            )
            .await?;

        Ok(mensagem)
    }

    pub async fn conversas_abertas(&self) -> Result<Vec<ChatConversa>, AppError> {
        self.conversas
            .filter(
                &Filter::eq("status", "aberta"),
                Some(&SortSpec::desc("data_ultima_mensagem")),
                Page::default(),
            )
            .await
    }

    pub async fn fechar_conversa(&self, conversa_id: Uuid) -> Result<ChatConversa, AppError> {
        let conversa = self.conversas.find(conversa_id).await?;
        if conversa.status == ConversaStatus::Fechada {
            return Err(AppError::BusinessRule("suporte.conversa_fechada"));
        }
        let conversa = self
            .conversas
            .update(conversa_id, &FecharConversa { status: ConversaStatus::Fechada })
            .await?;
        tracing::info!("🔒 Conversa '{}' encerrada", conversa.assunto);
        Ok(conversa)
    }

    // =========================================================================
    //  TICKETS
    // =========================================================================

    pub async fn abrir_ticket(&self, usuario: &Usuario, payload: AbrirTicketPayload) -> Result<SuporteTicket, AppError> {
        let ticket = self
            .tickets
            .create(
                &usuario.email,
                &NovoTicket {
                    usuario_email: usuario.email.clone(),
                    assunto: payload.assunto.trim().to_string(),
                    descricao: payload.descricao,
                    prioridade: payload.prioridade,
                    status: TicketStatus::Aberto,
                },
            )
            .await?;
        tracing::info!("🎫 Ticket '{}' aberto por {} ({:?})", ticket.assunto, usuario.email, ticket.prioridade);
        Ok(ticket)
    }

    pub async fn tickets_abertos(&self) -> Result<Vec<SuporteTicket>, AppError> {
        self.tickets
            .filter(&Filter::eq("status", "aberto"), Some(&SortSpec::asc("created_date")), Page::default())
            .await
    }

    pub async fn resolver_ticket(
        &self,
        ticket_id: Uuid,
        payload: ResolverTicketPayload,
    ) -> Result<SuporteTicket, AppError> {
        let ticket = self.tickets.find(ticket_id).await?;
        if ticket.status == TicketStatus::Resolvido {
            return Err(AppError::BusinessRule("suporte.ticket_resolvido"));
        }
        self.tickets
            .update(
                ticket_id,
                &ResolucaoTicket {
                    status: TicketStatus::Resolvido,
                    resposta: payload.resposta,
                    data_resolucao: Utc::now(),
                },
            )
            .await
    }
}
