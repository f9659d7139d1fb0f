// src/services/settings_service.rs

use crate::{
    common::error::AppError,
    db::{owned_by, Filter, Page, Repository, SortSpec},
    models::settings::{
        AtualizarConfiguracao, Configuracao, ConfiguracaoPublica, DefinirConfiguracaoPublica,
    },
};

#[derive(Clone)]
pub struct SettingsService {
    configuracoes: Repository<Configuracao>,
    publicas: Repository<ConfiguracaoPublica>,
}

impl SettingsService {
    pub fn new(configuracoes: Repository<Configuracao>, publicas: Repository<ConfiguracaoPublica>) -> Self {
        Self { configuracoes, publicas }
    }

    // --- Dados da empresa (um registro por conta) ---

    pub async fn obter(&self, owner: &str) -> Result<Option<Configuracao>, AppError> {
        Ok(self
            .configuracoes
            .list_owned(owner, Some(&SortSpec::asc("created_date")), Page::limit(1))
            .await?
            .into_iter()
            .next())
    }

    /// Cria na primeira gravação, atualiza nas seguintes.
    pub async fn salvar(
        &self,
        owner: &str,
        payload: &AtualizarConfiguracao,
    ) -> Result<Configuracao, AppError> {
        let config = match self.obter(owner).await? {
            Some(atual) => self.configuracoes.update(atual.id, payload).await?,
            None => self.configuracoes.create(owner, payload).await?,
        };
        tracing::info!("⚙️ Configurações da empresa salvas para {}", owner);
        Ok(config)
    }

    // --- Configurações da plataforma ---

    pub async fn listar_publicas(&self) -> Result<Vec<ConfiguracaoPublica>, AppError> {
        self.publicas
            .filter(&Filter::All, Some(&SortSpec::asc("chave")), Page::default())
            .await
    }

    pub async fn valor_publico(&self, chave: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .publicas
            .filter(&Filter::eq("chave", chave), None, Page::limit(1))
            .await?
            .into_iter()
            .next()
            .map(|c| c.valor))
    }

    pub async fn definir_publica(
        &self,
        admin: &str,
        payload: &DefinirConfiguracaoPublica,
    ) -> Result<ConfiguracaoPublica, AppError> {
        let existente = self
            .publicas
            .filter(&Filter::eq("chave", payload.chave.as_str()), None, Page::limit(1))
            .await?
            .into_iter()
            .next();

        let config = match existente {
            Some(atual) => self.publicas.update(atual.id, payload).await?,
            None => self.publicas.create(admin, payload).await?,
        };
        tracing::info!("🔧 Configuração pública '{}' definida por {}", config.chave, admin);
        Ok(config)
    }

    pub async fn contar_configuracoes(&self, owner: &str) -> Result<i64, AppError> {
        self.configuracoes.count(&owned_by(owner)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    fn service() -> SettingsService {
        let store = Arc::new(MemoryStore::new());
        SettingsService::new(Repository::new(store.clone()), Repository::new(store))
    }

    #[tokio::test]
    async fn company_settings_are_upserted_per_owner() {
        let service = service();
        assert!(service.obter("ana@loja.com").await.unwrap().is_none());

        let primeira = AtualizarConfiguracao { nome_empresa: Some("Loja da Ana".into()), ..Default::default() };
        service.salvar("ana@loja.com", &primeira).await.unwrap();

        let segunda = AtualizarConfiguracao { chave_pix: Some("ana@pix.com".into()), ..Default::default() };
        let config = service.salvar("ana@loja.com", &segunda).await.unwrap();

        assert_eq!(config.nome_empresa.as_deref(), Some("Loja da Ana"));
        assert_eq!(config.chave_pix.as_deref(), Some("ana@pix.com"));
        assert_eq!(service.contar_configuracoes("ana@loja.com").await.unwrap(), 1);
        assert!(service.obter("bia@loja.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn platform_setting_is_replaced_by_key() {
        let service = service();
        let definir = |valor: &str| DefinirConfiguracaoPublica {
            chave: "VALOR_MENSALIDADE".into(),
            valor: valor.into(),
        };

        service.definir_publica("admin@gestao.com", &definir("49.90")).await.unwrap();
        service.definir_publica("admin@gestao.com", &definir("59.90")).await.unwrap();

        assert_eq!(service.listar_publicas().await.unwrap().len(), 1);
        assert_eq!(
            service.valor_publico("VALOR_MENSALIDADE").await.unwrap().as_deref(),
            Some("59.90")
        );
    }
}
