// src/services/installment_plan.rs

use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::billing::{ClienteRef, NovaParcela, ParcelaStatus};

/// Intervalo entre vencimentos, em dias corridos.
pub const INTERVALO_PARCELAS: u64 = 30;

/// Maior número de parcelas aceito no crediário (10 anos de carnê).
pub const MAX_PARCELAS: u32 = 120;

/// Gera o plano de parcelas de uma venda no crediário.
///
/// - `quantidade` parcelas, numeradas de 1 a N;
/// - cada uma vale `total / N` arredondado para centavos (sem corrigir a sobra);
/// - a parcela `i` vence em `data_venda + 30 * i` dias;
/// - todas nascem `pendente` e sem data de pagamento.
///
/// `quantidade == 0` gera um plano vazio.
pub fn gerar_parcelas(
    total: Decimal,
    quantidade: u32,
    data_venda: NaiveDate,
    cliente: &ClienteRef,
) -> Vec<NovaParcela> {
    if quantidade == 0 {
        return Vec::new();
    }

    let valor = (total / Decimal::from(quantidade))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    (1..=quantidade)
        .map(|numero| NovaParcela {
            cliente: cliente.clone(),
            venda_id: None,
            numero_venda: None,
            numero_parcela: numero,
            total_parcelas: quantidade,
            valor,
            data_vencimento: vencimento(data_venda, numero),
            status: ParcelaStatus::Pendente,
            data_pagamento: None,
        })
        .collect()
}

fn vencimento(data_venda: NaiveDate, numero: u32) -> NaiveDate {
    let dias = INTERVALO_PARCELAS * u64::from(numero);
    // Só estoura perto de NaiveDate::MAX
    data_venda
        .checked_add_days(Days::new(dias))
        .unwrap_or(NaiveDate::MAX)
}
