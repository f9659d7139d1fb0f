// src/services/subscription_service.rs

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, Page, Repository, SortSpec},
    events::{DomainEvent, EventBus},
    models::{
        auth::{UserStatus, Usuario},
        settings::{CHAVE_PIX, NOME_BANCO_PIX, NOME_TITULAR_PIX, VALOR_MENSALIDADE},
        subscription::{
            DecisaoRevisao, EnviarComprovantePayload, Inadimplente, NovoPagamento, Pagamento,
            PagamentoStatus, RevisaoPagamento, RevisarPagamentoPayload, StatusMensalidade,
        },
    },
    services::{auth::AuthService, settings_service::SettingsService},
};

/// Mês de referência no formato `MM/YYYY`.
pub fn mes_referencia(hoje: NaiveDate) -> String {
    hoje.format("%m/%Y").to_string()
}

/// Em dia: admin, status `ativo`, ou comprovante válido para o mês.
pub fn esta_em_dia(usuario: &Usuario, pagamentos_do_mes: &[Pagamento]) -> bool {
    usuario.is_admin()
        || usuario.status == UserStatus::Ativo
        || pagamentos_do_mes.iter().any(|p| p.status.conta_como_em_dia())
}

#[derive(Clone)]
pub struct SubscriptionService {
    pagamentos: Repository<Pagamento>,
    auth: AuthService,
    settings: SettingsService,
    events: EventBus,
}

impl SubscriptionService {
    pub fn new(
        pagamentos: Repository<Pagamento>,
        auth: AuthService,
        settings: SettingsService,
        events: EventBus,
    ) -> Self {
        Self { pagamentos, auth, settings, events }
    }

    async fn do_mes(&self, usuario_id: Uuid, mes: &str) -> Result<Vec<Pagamento>, AppError> {
        let filtro = Filter::eq("empresa_id", usuario_id.to_string()).and(Filter::eq("mes_referencia", mes));
        self.pagamentos.filter(&filtro, None, Page::default()).await
    }

    async fn valor_mensalidade(&self) -> Result<Option<Decimal>, AppError> {
        Ok(self
            .settings
            .valor_publico(VALOR_MENSALIDADE)
            .await?
            .and_then(|v| Decimal::from_str(v.trim().replace(',', ".").as_str()).ok()))
    }

    // =========================================================================
    //  USUÁRIO
    // =========================================================================

    pub async fn enviar_comprovante(
        &self,
        usuario: &Usuario,
        payload: EnviarComprovantePayload,
        hoje: NaiveDate,
    ) -> Result<Pagamento, AppError> {
        let mes = mes_referencia(hoje);
        let existentes = self.do_mes(usuario.id, &mes).await?;
        if existentes.iter().any(|p| p.status.conta_como_em_dia()) {
            return Err(AppError::BusinessRule("mensalidade.ja_enviada"));
        }

        let valor = match payload.valor {
            Some(valor) => valor,
            None => self
                .valor_mensalidade()
                .await?
                .ok_or(AppError::BusinessRule("mensalidade.valor_indefinido"))?,
        };

        let pagamento = self
            .pagamentos
            .create(
                &usuario.email,
                &NovoPagamento {
                    empresa_id: usuario.id,
                    empresa_nome: usuario.nome_empresa.clone().unwrap_or_else(|| usuario.full_name.clone()),
                    mes_referencia: mes,
                    valor,
                    comprovante_url: payload.comprovante_url,
                    status: PagamentoStatus::AguardandoVerificacao,
                    observacoes: payload.observacoes,
                },
            )
            .await?;

        tracing::info!("📤 Comprovante de {} enviado para {}", pagamento.mes_referencia, usuario.email);
        self.events.publish(DomainEvent::PaymentSubmitted {
            owner: usuario.email.clone(),
            pagamento_id: pagamento.id,
        });
        Ok(pagamento)
    }

    pub async fn meus_pagamentos(&self, usuario: &Usuario) -> Result<Vec<Pagamento>, AppError> {
        self.pagamentos
            .filter(
                &Filter::eq("empresa_id", usuario.id.to_string()),
                Some(&SortSpec::desc("created_date")),
                Page::default(),
            )
            .await
    }

    pub async fn em_dia(&self, usuario: &Usuario, hoje: NaiveDate) -> Result<bool, AppError> {
        if usuario.is_admin() || usuario.status == UserStatus::Ativo {
            return Ok(true);
        }
        let do_mes = self.do_mes(usuario.id, &mes_referencia(hoje)).await?;
        Ok(esta_em_dia(usuario, &do_mes))
    }

    pub async fn status(&self, usuario: &Usuario, hoje: NaiveDate) -> Result<StatusMensalidade, AppError> {
        let mes = mes_referencia(hoje);
        let mut do_mes = self.do_mes(usuario.id, &mes).await?;
        let em_dia = esta_em_dia(usuario, &do_mes);

        // Prefere o comprovante que ainda vale; senão, o mais recente
        do_mes.sort_by_key(|p| (p.status.conta_como_em_dia(), p.created_date));
        let pagamento_atual = do_mes.pop();

        Ok(StatusMensalidade {
            em_dia,
            mes_referencia: mes,
            pagamento_atual,
            valor_mensalidade: self.valor_mensalidade().await?,
            chave_pix: self.settings.valor_publico(CHAVE_PIX).await?,
            nome_banco_pix: self.settings.valor_publico(NOME_BANCO_PIX).await?,
            nome_titular_pix: self.settings.valor_publico(NOME_TITULAR_PIX).await?,
        })
    }

    // =========================================================================
    //  ADMIN
    // =========================================================================

    pub async fn todos_pagamentos(&self, status: Option<PagamentoStatus>) -> Result<Vec<Pagamento>, AppError> {
        let filtro = match status {
            Some(status) => Filter::eq("status", serde_json::to_value(status)?),
            None => Filter::All,
        };
        self.pagamentos
            .filter(&filtro, Some(&SortSpec::desc("created_date")), Page::default())
            .await
    }

    /// Aprovar também reativa o usuário.
    pub async fn revisar(
        &self,
        admin: &Usuario,
        pagamento_id: Uuid,
        payload: RevisarPagamentoPayload,
    ) -> Result<Pagamento, AppError> {
        let pagamento = self.pagamentos.find(pagamento_id).await?;
        if pagamento.status != PagamentoStatus::AguardandoVerificacao {
            return Err(AppError::BusinessRule("mensalidade.ja_revisada"));
        }

        let status = match payload.decisao {
            DecisaoRevisao::Aprovado => PagamentoStatus::Aprovado,
            DecisaoRevisao::Recusado => PagamentoStatus::Recusado,
        };
        let pagamento = self
            .pagamentos
            .update(
                pagamento_id,
                &RevisaoPagamento {
                    status,
                    observacoes: payload.observacoes,
                    verificado_por: admin.email.clone(),
                    data_verificacao: Utc::now(),
                },
            )
            .await?;

        let aprovado = status == PagamentoStatus::Aprovado;
        if aprovado {
            self.auth.definir_status(pagamento.empresa_id, UserStatus::Ativo).await?;
        }

        tracing::info!(
            "✅ Pagamento {} de '{}' revisado por {}: {:?}",
            pagamento.mes_referencia, pagamento.empresa_nome, admin.email, status
        );
        self.events.publish(DomainEvent::PaymentReviewed {
            owner: pagamento.created_by.clone(),
            pagamento_id,
            aprovado,
        });
        Ok(pagamento)
    }

    /// Usuários (não admin) sem comprovante válido no mês corrente.
    pub async fn inadimplentes(&self, hoje: NaiveDate) -> Result<Vec<Inadimplente>, AppError> {
        let mes = mes_referencia(hoje);
        let usuarios = self.auth.listar_usuarios().await?;
        let pagamentos = self.todos_pagamentos(None).await?;

        let lista = usuarios
            .into_iter()
            .filter(|u| !u.is_admin())
            .filter_map(|u| {
                let dele: Vec<&Pagamento> = pagamentos.iter().filter(|p| p.empresa_id == u.id).collect();
                let pagou_o_mes = dele
                    .iter()
                    .any(|p| p.mes_referencia == mes && p.status.conta_como_em_dia());
                if pagou_o_mes {
                    return None;
                }
                // `pagamentos` vem do mais recente para o mais antigo
                let ultimo_pagamento = dele
                    .iter()
                    .find(|p| p.status == PagamentoStatus::Aprovado)
                    .map(|p| p.mes_referencia.clone());
                Some(Inadimplente {
                    usuario_id: u.id,
                    email: u.email,
                    full_name: u.full_name,
                    status: u.status,
                    ultimo_pagamento,
                })
            })
            .collect();
        Ok(lista)
    }

    /// Soma das mensalidades aprovadas (receita da plataforma).
    pub async fn receita_aprovada(&self) -> Result<Decimal, AppError> {
        Ok(self
            .todos_pagamentos(Some(PagamentoStatus::Aprovado))
            .await?
            .iter()
            .map(|p| p.valor)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            auth::{AdminUpdateUserPayload, RegisterUserPayload, UserRole},
            settings::DefinirConfiguracaoPublica,
        },
    };
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Fixture {
        service: SubscriptionService,
        auth: AuthService,
        settings: SettingsService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(Repository::new(store.clone()), "segredo".into(), vec!["admin@gestao.com".into()]);
        let settings = SettingsService::new(Repository::new(store.clone()), Repository::new(store.clone()));
        let service = SubscriptionService::new(Repository::new(store), auth.clone(), settings.clone(), EventBus::default());
        Fixture { service, auth, settings }
    }

    async fn registrar(auth: &AuthService, email: &str) -> Usuario {
        let token = auth
            .register_user(RegisterUserPayload {
                email: email.into(),
                password: "senha123".into(),
                full_name: "Ana Lima".into(),
                aceitou_termos: true,
            })
            .await
            .unwrap();
        auth.validate_token(&token).await.unwrap()
    }

    fn hoje() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn comprovante() -> EnviarComprovantePayload {
        EnviarComprovantePayload {
            comprovante_url: "https://arquivos.exemplo.com/comprovante.pdf".into(),
            valor: None,
            observacoes: None,
        }
    }

    #[test]
    fn reference_month_is_zero_padded() {
        assert_eq!(mes_referencia(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), "03/2024");
    }

    #[tokio::test]
    async fn submission_uses_platform_fee_and_blocks_duplicates() {
        let f = fixture();
        f.settings
            .definir_publica("admin@gestao.com", &DefinirConfiguracaoPublica {
                chave: VALOR_MENSALIDADE.into(),
                valor: "49,90".into(),
            })
            .await
            .unwrap();
        let ana = registrar(&f.auth, "ana@loja.com").await;

        let pagamento = f.service.enviar_comprovante(&ana, comprovante(), hoje()).await.unwrap();
        assert_eq!(pagamento.valor, dec!(49.90));
        assert_eq!(pagamento.mes_referencia, "03/2024");
        assert_eq!(pagamento.status, PagamentoStatus::AguardandoVerificacao);

        let err = f.service.enviar_comprovante(&ana, comprovante(), hoje()).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("mensalidade.ja_enviada")));
    }

    #[tokio::test]
    async fn approval_reactivates_user_and_clears_overdue_list() {
        let f = fixture();
        let admin = registrar(&f.auth, "admin@gestao.com").await;
        let ana = registrar(&f.auth, "ana@loja.com").await;
        let ana = f
            .auth
            .admin_update(ana.id, &AdminUpdateUserPayload { role: None, status: Some(UserStatus::Inativo) })
            .await
            .unwrap();

        assert!(!f.service.em_dia(&ana, hoje()).await.unwrap());
        let inadimplentes = f.service.inadimplentes(hoje()).await.unwrap();
        assert_eq!(inadimplentes.len(), 1);
        assert_eq!(inadimplentes[0].email, "ana@loja.com");

        let mut payload = comprovante();
        payload.valor = Some(dec!(59.90));
        let pagamento = f.service.enviar_comprovante(&ana, payload, hoje()).await.unwrap();

        // Aguardando verificação já conta como em dia
        assert!(f.service.em_dia(&ana, hoje()).await.unwrap());

        let revisado = f
            .service
            .revisar(&admin, pagamento.id, RevisarPagamentoPayload { decisao: DecisaoRevisao::Aprovado, observacoes: None })
            .await
            .unwrap();
        assert_eq!(revisado.status, PagamentoStatus::Aprovado);
        assert_eq!(revisado.verificado_por.as_deref(), Some("admin@gestao.com"));

        let ana = f.auth.listar_usuarios().await.unwrap().into_iter().find(|u| u.email == "ana@loja.com").unwrap();
        assert_eq!(ana.status, UserStatus::Ativo);
        assert!(f.service.inadimplentes(hoje()).await.unwrap().is_empty());
        assert_eq!(f.service.receita_aprovada().await.unwrap(), dec!(59.90));

        let err = f
            .service
            .revisar(&admin, pagamento.id, RevisarPagamentoPayload { decisao: DecisaoRevisao::Recusado, observacoes: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("mensalidade.ja_revisada")));
    }

    #[tokio::test]
    async fn refused_payment_does_not_count() {
        let f = fixture();
        let admin = registrar(&f.auth, "admin@gestao.com").await;
        assert_eq!(admin.role, UserRole::Admin);
        let ana = registrar(&f.auth, "ana@loja.com").await;
        let ana = f
            .auth
            .admin_update(ana.id, &AdminUpdateUserPayload { role: None, status: Some(UserStatus::Bloqueado) })
            .await
            .unwrap();

        let mut payload = comprovante();
        payload.valor = Some(dec!(10));
        let pagamento = f.service.enviar_comprovante(&ana, payload, hoje()).await.unwrap();
        f.service
            .revisar(&admin, pagamento.id, RevisarPagamentoPayload { decisao: DecisaoRevisao::Recusado, observacoes: None })
            .await
            .unwrap();

        let status = f.service.status(&ana, hoje()).await.unwrap();
        assert!(!status.em_dia);
        assert_eq!(status.pagamento_atual.map(|p| p.status), Some(PagamentoStatus::Recusado));

        // Depois de recusado, pode reenviar
        let mut payload = comprovante();
        payload.valor = Some(dec!(10));
        assert!(f.service.enviar_comprovante(&ana, payload, hoje()).await.is_ok());
    }
}
