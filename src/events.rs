// src/events.rs

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::EntityKind;

/// Tudo que muda estado de negócio publica um evento aqui.
/// `owner` é o e-mail da conta dona dos registros afetados.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    SaleCreated { owner: String, venda_id: Uuid, valor_total: Decimal },
    InstallmentsScheduled { owner: String, venda_id: Uuid, quantidade: usize },
    InstallmentPaid { owner: String, parcela_id: Uuid },
    StockDecremented { owner: String, produto_id: Uuid, quantidade: i64 },
    ProductChanged { owner: String, produto_id: Uuid },
    ClientChanged { owner: String, cliente_id: Uuid },
    DocumentIssued { owner: String, documento_id: Uuid },
    ImportCompleted { owner: String, kind: EntityKind, quantidade: usize },
    PaymentSubmitted { owner: String, pagamento_id: Uuid },
    PaymentReviewed { owner: String, pagamento_id: Uuid, aprovado: bool },
}

impl DomainEvent {
    pub fn owner(&self) -> &str {
        match self {
            DomainEvent::SaleCreated { owner, .. }
            | DomainEvent::InstallmentsScheduled { owner, .. }
            | DomainEvent::InstallmentPaid { owner, .. }
            | DomainEvent::StockDecremented { owner, .. }
            | DomainEvent::ProductChanged { owner, .. }
            | DomainEvent::ClientChanged { owner, .. }
            | DomainEvent::DocumentIssued { owner, .. }
            | DomainEvent::ImportCompleted { owner, .. }
            | DomainEvent::PaymentSubmitted { owner, .. }
            | DomainEvent::PaymentReviewed { owner, .. } => owner,
        }
    }

    /// Afeta os números de vendas/estoque/cobranças da conta?
    pub fn touches_business_data(&self) -> bool {
        !matches!(
            self,
            DomainEvent::DocumentIssued { .. }
                | DomainEvent::PaymentSubmitted { .. }
                | DomainEvent::PaymentReviewed { .. }
        )
    }

    /// Afeta os números do painel do admin?
    pub fn touches_platform_data(&self) -> bool {
        matches!(
            self,
            DomainEvent::SaleCreated { .. }
                | DomainEvent::PaymentReviewed { .. }
                | DomainEvent::ImportCompleted { .. }
        )
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// Barramento de eventos em processo (broadcast).
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publicar nunca falha para quem publica: sem assinantes, o evento é descartado.
    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!("📣 Evento publicado: {:?}", event);
        if self.sender.send(event).is_err() {
            tracing::debug!("Nenhum assinante para o evento");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let venda_id = Uuid::new_v4();
        bus.publish(DomainEvent::SaleCreated {
            owner: "ana@loja.com".into(),
            venda_id,
            valor_total: dec!(300.00),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.owner(), "ana@loja.com");
        assert!(event.touches_business_data());
        assert!(event.touches_platform_data());
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(DomainEvent::InstallmentPaid {
            owner: "ana@loja.com".into(),
            parcela_id: Uuid::new_v4(),
        });
    }
}
