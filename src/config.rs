// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{EntityStore, MemoryStore, PgStore, Repository},
    events::EventBus,
    read_models::ReadModels,
    services::{
        auth::AuthService, billing_service::BillingService, crm_service::CrmService,
        dashboard_service::DashboardService, document_service::DocumentService,
        import_service::ImportService, inventory_service::InventoryService,
        sale_service::SaleService, settings_service::SettingsService,
        subscription_service::SubscriptionService, support_service::SupportService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FONTS_DIR: &str = "./fonts";

// =============================================================================
//  CONFIGURAÇÃO (variáveis de ambiente)
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Sem `DATABASE_URL` o servidor sobe com o store em memória.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub admin_emails: Vec<String>,
    pub fonts_dir: String,
}

fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|raw| parse_admin_emails(&raw))
                .unwrap_or_default(),
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| DEFAULT_FONTS_DIR.to_string()),
        })
    }

    /// Configuração fixa para testes (store em memória).
    pub fn for_tests(admin_emails: &[&str]) -> Self {
        Self {
            database_url: None,
            jwt_secret: "segredo-de-teste".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_emails: admin_emails.iter().map(|e| e.to_lowercase()).collect(),
            fonts_dir: DEFAULT_FONTS_DIR.to_string(),
        }
    }
}

// =============================================================================
//  ESTADO DA APLICAÇÃO
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub i18n_store: Arc<I18nStore>,
    pub events: EventBus,
    pub read_models: Arc<ReadModels>,

    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub sale_service: SaleService,
    pub billing_service: BillingService,
    pub document_service: DocumentService,
    pub settings_service: SettingsService,
    pub subscription_service: SubscriptionService,
    pub support_service: SupportService,
    pub dashboard_service: DashboardService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        match &config.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                let store = Arc::new(PgStore::new(db_pool.clone()));
                Ok(Self::build(config, store, Some(db_pool)))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL não definida: usando o store em memória (dados são perdidos ao reiniciar)");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        Self::build(config, Arc::new(MemoryStore::new()), None)
    }

    // --- Monta o gráfico de dependências ---
    fn build(config: &AppConfig, store: Arc<dyn EntityStore>, db_pool: Option<PgPool>) -> Self {
        let events = EventBus::default();
        let read_models = Arc::new(ReadModels::new(&events));

        let auth_service = AuthService::new(
            Repository::new(store.clone()),
            config.jwt_secret.clone(),
            config.admin_emails.clone(),
        );
        let settings_service =
            SettingsService::new(Repository::new(store.clone()), Repository::new(store.clone()));
        let billing_service =
            BillingService::new(Repository::new(store.clone()), events.clone(), read_models.clone());
        let inventory_service = InventoryService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            events.clone(),
        );
        let crm_service = CrmService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            billing_service.clone(),
            events.clone(),
        );
        let sale_service = SaleService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            inventory_service.clone(),
            events.clone(),
        );
        let document_service = DocumentService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            settings_service.clone(),
            events.clone(),
            config.fonts_dir.clone(),
        );
        let subscription_service = SubscriptionService::new(
            Repository::new(store.clone()),
            auth_service.clone(),
            settings_service.clone(),
            events.clone(),
        );
        let support_service = SupportService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
        );
        let dashboard_service = DashboardService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            billing_service.clone(),
            auth_service.clone(),
            subscription_service.clone(),
            read_models.clone(),
        );
        let import_service =
            ImportService::new(Repository::new(store.clone()), Repository::new(store), events.clone());

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::default()),
            events,
            read_models,
            auth_service,
            crm_service,
            inventory_service,
            sale_service,
            billing_service,
            document_service,
            settings_service,
            subscription_service,
            support_service,
            dashboard_service,
            import_service,
        }
    }
}
