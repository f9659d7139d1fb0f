// src/read_models.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::{
    broadcast::{self, error::TryRecvError},
    Mutex, RwLock,
};

use crate::{
    events::{DomainEvent, EventBus},
    models::{
        billing::ResumoCobrancas,
        dashboard::{AdminDashboard, DashboardResumo},
    },
};

// Chave do painel do admin, que não pertence a uma conta
const PLATFORM: &str = "*";

/// Valor calculado num dia. Muda de dia, vira lixo: o "hoje" faz parte do cálculo.
#[derive(Debug, Clone)]
struct Snapshot<V> {
    dia: NaiveDate,
    valor: V,
}

/// Marca de validade de um cálculo. Capturada na falha de cache e conferida
/// na gravação: se algum evento invalidou a conta nesse meio-tempo, o valor
/// calculado é descartado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geracao {
    epoca: u64,
    conta: u64,
}

/// Resultado de uma consulta ao cache.
#[derive(Debug)]
pub enum Leitura<V> {
    Cache(V),
    Calcular(Geracao),
}

#[derive(Debug)]
struct Estado<V> {
    entries: HashMap<String, Snapshot<V>>,
    geracoes: HashMap<String, u64>,
    // Sobe a cada limpeza geral
    epoca: u64,
}

#[derive(Debug)]
pub struct OwnerCache<V> {
    estado: RwLock<Estado<V>>,
}

impl<V> Default for OwnerCache<V> {
    fn default() -> Self {
        Self {
            estado: RwLock::new(Estado {
                entries: HashMap::new(),
                geracoes: HashMap::new(),
                epoca: 0,
            }),
        }
    }
}

impl<V> Estado<V> {
    fn geracao(&self, owner: &str) -> Geracao {
        Geracao {
            epoca: self.epoca,
            conta: self.geracoes.get(owner).copied().unwrap_or(0),
        }
    }
}

impl<V: Clone> OwnerCache<V> {
    pub async fn get(&self, owner: &str, hoje: NaiveDate) -> Leitura<V> {
        let estado = self.estado.read().await;
        match estado.entries.get(owner).filter(|s| s.dia == hoje) {
            Some(snapshot) => Leitura::Cache(snapshot.valor.clone()),
            None => Leitura::Calcular(estado.geracao(owner)),
        }
    }

    /// Grava o valor só se nada mudou desde a `geracao` capturada.
    pub async fn put(&self, owner: &str, hoje: NaiveDate, geracao: Geracao, valor: V) -> bool {
        let mut estado = self.estado.write().await;
        if estado.geracao(owner) != geracao {
            tracing::debug!("♻️ Cálculo de '{}' ficou velho antes de ser gravado; descartado", owner);
            return false;
        }
        estado.entries.insert(owner.to_string(), Snapshot { dia: hoje, valor });
        true
    }

    pub async fn invalidate(&self, owner: &str) {
        let mut estado = self.estado.write().await;
        estado.entries.remove(owner);
        *estado.geracoes.entry(owner.to_string()).or_insert(0) += 1;
    }

    pub async fn clear(&self) {
        let mut estado = self.estado.write().await;
        estado.entries.clear();
        estado.geracoes.clear();
        estado.epoca += 1;
    }
}

/// Projeções de leitura que se atualizam a partir do barramento de eventos.
///
/// Cada leitura drena primeiro os eventos pendentes. Como `publish` entrega
/// o evento no canal antes de a mutação responder, uma leitura feita depois
/// de uma escrita nunca vê o valor antigo. Um cálculo que atravessa uma
/// invalidação não é gravado (ver [`Geracao`]).
pub struct ReadModels {
    events: Mutex<broadcast::Receiver<DomainEvent>>,
    billing: OwnerCache<ResumoCobrancas>,
    dashboard: OwnerCache<DashboardResumo>,
    admin: OwnerCache<AdminDashboard>,
}

impl ReadModels {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            events: Mutex::new(bus.subscribe()),
            billing: OwnerCache::default(),
            dashboard: OwnerCache::default(),
            admin: OwnerCache::default(),
        }
    }

    async fn sync(&self) {
        let mut rx = self.events.lock().await;
        loop {
            match rx.try_recv() {
                Ok(event) => self.apply(&event).await,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("⚠️ Read models perderam {} eventos; limpando caches", skipped);
                    self.billing.clear().await;
                    self.dashboard.clear().await;
                    self.admin.clear().await;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    async fn apply(&self, event: &DomainEvent) {
        if event.touches_business_data() {
            self.billing.invalidate(event.owner()).await;
            self.dashboard.invalidate(event.owner()).await;
        }
        if event.touches_platform_data() {
            self.admin.invalidate(PLATFORM).await;
        }
    }

    pub async fn billing_summary(&self, owner: &str, hoje: NaiveDate) -> Leitura<ResumoCobrancas> {
        self.sync().await;
        self.billing.get(owner, hoje).await
    }

    pub async fn store_billing_summary(
        &self,
        owner: &str,
        hoje: NaiveDate,
        geracao: Geracao,
        resumo: ResumoCobrancas,
    ) -> bool {
        self.billing.put(owner, hoje, geracao, resumo).await
    }

    pub async fn dashboard(&self, owner: &str, hoje: NaiveDate) -> Leitura<DashboardResumo> {
        self.sync().await;
        self.dashboard.get(owner, hoje).await
    }

    pub async fn store_dashboard(
        &self,
        owner: &str,
        hoje: NaiveDate,
        geracao: Geracao,
        resumo: DashboardResumo,
    ) -> bool {
        self.dashboard.put(owner, hoje, geracao, resumo).await
    }

    pub async fn admin_dashboard(&self, hoje: NaiveDate) -> Leitura<AdminDashboard> {
        self.sync().await;
        self.admin.get(PLATFORM, hoje).await
    }

    pub async fn store_admin_dashboard(&self, hoje: NaiveDate, geracao: Geracao, painel: AdminDashboard) -> bool {
        self.admin.put(PLATFORM, hoje, geracao, painel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::billing::TotalizadorCobranca;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn dia(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn resumo() -> ResumoCobrancas {
        ResumoCobrancas {
            atrasadas: TotalizadorCobranca { quantidade: 1, total: dec!(100.00) },
            ..Default::default()
        }
    }

    async fn geracao(models: &ReadModels, owner: &str, hoje: NaiveDate) -> Geracao {
        match models.billing_summary(owner, hoje).await {
            Leitura::Calcular(geracao) => geracao,
            Leitura::Cache(_) => panic!("esperava cache vazio para {owner}"),
        }
    }

    async fn em_cache(models: &ReadModels, owner: &str, hoje: NaiveDate) -> bool {
        matches!(models.billing_summary(owner, hoje).await, Leitura::Cache(_))
    }

    #[tokio::test]
    async fn cached_summary_is_dropped_when_owner_data_changes() {
        let bus = EventBus::default();
        let models = ReadModels::new(&bus);

        let g_ana = geracao(&models, "ana@loja.com", dia(15)).await;
        let g_bia = geracao(&models, "bia@loja.com", dia(15)).await;
        assert!(models.store_billing_summary("ana@loja.com", dia(15), g_ana, resumo()).await);
        assert!(models.store_billing_summary("bia@loja.com", dia(15), g_bia, resumo()).await);
        assert!(em_cache(&models, "ana@loja.com", dia(15)).await);

        bus.publish(DomainEvent::InstallmentPaid {
            owner: "ana@loja.com".into(),
            parcela_id: Uuid::new_v4(),
        });

        assert!(!em_cache(&models, "ana@loja.com", dia(15)).await);
        assert!(em_cache(&models, "bia@loja.com", dia(15)).await);
    }

    #[tokio::test]
    async fn cached_summary_expires_on_day_change() {
        let bus = EventBus::default();
        let models = ReadModels::new(&bus);

        let g = geracao(&models, "ana@loja.com", dia(15)).await;
        models.store_billing_summary("ana@loja.com", dia(15), g, resumo()).await;
        assert!(!em_cache(&models, "ana@loja.com", dia(16)).await);
    }

    #[tokio::test]
    async fn summary_computed_across_an_invalidation_is_not_stored() {
        let bus = EventBus::default();
        let models = ReadModels::new(&bus);

        // Leitor A falha no cache e começa a calcular com os dados antigos
        let g_leitor_a = geracao(&models, "ana@loja.com", dia(15)).await;

        // Uma baixa acontece e o leitor B drena o evento
        bus.publish(DomainEvent::InstallmentPaid {
            owner: "ana@loja.com".into(),
            parcela_id: Uuid::new_v4(),
        });
        let g_leitor_b = geracao(&models, "ana@loja.com", dia(15)).await;
        assert_ne!(g_leitor_a, g_leitor_b);

        // A termina e tenta gravar o valor velho
        assert!(!models.store_billing_summary("ana@loja.com", dia(15), g_leitor_a, resumo()).await);
        assert!(!em_cache(&models, "ana@loja.com", dia(15)).await);

        // B calculou depois do evento: esse vale
        assert!(models.store_billing_summary("ana@loja.com", dia(15), g_leitor_b, resumo()).await);
        assert!(em_cache(&models, "ana@loja.com", dia(15)).await);
    }

    #[tokio::test]
    async fn lagging_behind_clears_everything() {
        let bus = EventBus::new(1);
        let models = ReadModels::new(&bus);
        let g = geracao(&models, "bia@loja.com", dia(15)).await;
        models.store_billing_summary("bia@loja.com", dia(15), g, resumo()).await;

        for _ in 0..3 {
            bus.publish(DomainEvent::ProductChanged {
                owner: "ana@loja.com".into(),
                produto_id: Uuid::new_v4(),
            });
        }

        assert!(!em_cache(&models, "bia@loja.com", dia(15)).await);
        // Um cálculo iniciado antes da limpeza também não vale mais
        assert!(!models.store_billing_summary("bia@loja.com", dia(15), g, resumo()).await);
    }
}
