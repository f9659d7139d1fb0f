// src/models/import.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::EntityKind;

/// Resultado de uma extração de dados já concluída.
/// `status` precisa ser `"success"` para a importação seguir.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportacaoPayload {
    pub status: String,
    pub output: Option<SaidaExtracao>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaidaExtracao {
    #[serde(default)]
    pub registros: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportacaoResultado {
    pub entidade: EntityKind,
    pub importados: usize,
}
