// src/db/store.rs

use std::{cmp::Ordering, fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// =============================================================================
//  TIPOS DE ENTIDADE (Registro fechado)
// =============================================================================

/// Todas as entidades que o entity store conhece.
/// Nomes vindos de fora (ex: importação) passam por `FromStr` e nomes
/// desconhecidos são rejeitados na borda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EntityKind {
    Usuario,
    Cliente,
    Produto,
    MovimentacaoEstoque,
    Venda,
    Parcela,
    NotaServico,
    Recibo,
    Pagamento,
    Configuracao,
    ConfiguracaoPublica,
    ChatConversa,
    ChatMessage,
    SuporteTicket,
}

impl EntityKind {
    pub const ALL: [EntityKind; 14] = [
        EntityKind::Usuario,
        EntityKind::Cliente,
        EntityKind::Produto,
        EntityKind::MovimentacaoEstoque,
        EntityKind::Venda,
        EntityKind::Parcela,
        EntityKind::NotaServico,
        EntityKind::Recibo,
        EntityKind::Pagamento,
        EntityKind::Configuracao,
        EntityKind::ConfiguracaoPublica,
        EntityKind::ChatConversa,
        EntityKind::ChatMessage,
        EntityKind::SuporteTicket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Usuario => "Usuario",
            EntityKind::Cliente => "Cliente",
            EntityKind::Produto => "Produto",
            EntityKind::MovimentacaoEstoque => "MovimentacaoEstoque",
            EntityKind::Venda => "Venda",
            EntityKind::Parcela => "Parcela",
            EntityKind::NotaServico => "NotaServico",
            EntityKind::Recibo => "Recibo",
            EntityKind::Pagamento => "Pagamento",
            EntityKind::Configuracao => "Configuracao",
            EntityKind::ConfiguracaoPublica => "ConfiguracaoPublica",
            EntityKind::ChatConversa => "ChatConversa",
            EntityKind::ChatMessage => "ChatMessage",
            EntityKind::SuporteTicket => "SuporteTicket",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::UnknownEntity(s.to_string()))
    }
}

// =============================================================================
//  PREDICADOS DE FILTRO
// =============================================================================

/// Linguagem de filtro do entity store.
/// Campos são nomes de propriedades no documento JSON do registro.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    /// Substring, sem diferenciar maiúsculas/minúsculas
    Contains(String, String),
    Lt(String, Value),
    Gt(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn contains(field: &str, term: &str) -> Self {
        Filter::Contains(field.to_string(), term.to_string())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(field.to_string(), value.into())
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gt(field.to_string(), value.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut parts), f) => {
                parts.push(f);
                Filter::And(parts)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Avalia o predicado contra um documento (usado pelo backend em memória).
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => match (record.get(field), expected) {
                (Some(actual), expected) => compare_values(actual, expected) == Some(Ordering::Equal),
                (None, Value::Null) => true,
                (None, _) => false,
            },
            Filter::Contains(field, term) => record
                .get(field)
                .map(|v| match v {
                    Value::String(s) => s.to_lowercase().contains(&term.to_lowercase()),
                    other => other.to_string().to_lowercase().contains(&term.to_lowercase()),
                })
                .unwrap_or(false),
            Filter::Lt(field, bound) => record
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o == Ordering::Less),
            Filter::Gt(field, bound) => record
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o == Ordering::Greater),
            Filter::And(parts) => parts.iter().all(|f| f.matches(record)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(record)),
        }
    }
}

/// Compara dois valores JSON do mesmo tipo.
/// Datas ISO (`YYYY-MM-DD`) e timestamps RFC 3339 ordenam corretamente como texto.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

// =============================================================================
//  ORDENAÇÃO
// =============================================================================

/// `"campo"` ordena ascendente, `"-campo"` descendente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), descending: false }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), descending: true }
    }
}

impl FromStr for SortSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (field, descending) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::BusinessRule("erro.validacao"));
        }
        Ok(Self { field: field.to_string(), descending })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit: Some(limit), offset: Some(offset) }
    }

    pub fn limit(limit: i64) -> Self {
        Self { limit: Some(limit), offset: None }
    }
}

// =============================================================================
//  O CONTRATO DO ENTITY STORE
// =============================================================================

/// Contrato de persistência por tipo de entidade.
/// Registros são documentos JSON; `create` preenche `id`, `created_date` e
/// `updated_date`. `update` faz merge raso dos campos informados.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn filter(
        &self,
        kind: EntityKind,
        predicate: &Filter,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<Value>, AppError>;

    async fn count(&self, kind: EntityKind, predicate: &Filter) -> Result<i64, AppError>;

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Value>, AppError>;

    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, AppError>;

    async fn update(&self, kind: EntityKind, id: Uuid, partial: Value) -> Result<Value, AppError>;

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<(), AppError>;

    async fn bulk_create(&self, kind: EntityKind, records: Vec<Value>) -> Result<(), AppError>;

    async fn list(
        &self,
        kind: EntityKind,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<Value>, AppError> {
        self.filter(kind, &Filter::All, sort, page).await
    }
}

/// Carimba os metadados de criação num documento novo.
pub(crate) fn stamp_new(mut fields: Value) -> Result<(Uuid, Value), AppError> {
    let now = chrono::Utc::now().to_rfc3339();
    let obj = fields
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("registro precisa ser um objeto JSON"))?;

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    obj.insert("id".into(), Value::String(id.to_string()));
    obj.entry("created_date").or_insert_with(|| Value::String(now.clone()));
    obj.insert("updated_date".into(), Value::String(now));
    Ok((id, fields))
}

/// Campos que o `update` nunca sobrescreve.
pub(crate) const IMMUTABLE_FIELDS: [&str; 3] = ["id", "created_date", "created_by"];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("Cliente", EntityKind::Cliente)]
    #[case("produto", EntityKind::Produto)]
    #[case("NOTASERVICO", EntityKind::NotaServico)]
    fn entity_kind_parses_case_insensitively(#[case] input: &str, #[case] expected: EntityKind) {
        assert_eq!(input.parse::<EntityKind>().unwrap(), expected);
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let err = "Fornecedor".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, AppError::UnknownEntity(name) if name == "Fornecedor"));
    }

    #[rstest]
    #[case("-created_date", "created_date", true)]
    #[case("data_vencimento", "data_vencimento", false)]
    fn sort_spec_parses_direction(#[case] input: &str, #[case] field: &str, #[case] desc: bool) {
        let spec: SortSpec = input.parse().unwrap();
        assert_eq!(spec.field, field);
        assert_eq!(spec.descending, desc);
    }

    #[test]
    fn sort_spec_rejects_injection() {
        assert!("nome; DROP TABLE".parse::<SortSpec>().is_err());
        assert!("-".parse::<SortSpec>().is_err());
    }

    #[test]
    fn filter_combinators_match_documents() {
        let doc = json!({
            "status": "pendente",
            "cliente_nome": "Maria Souza",
            "data_vencimento": "2024-01-10",
            "valor": 100.0
        });

        let overdue = Filter::eq("status", "pendente").and(Filter::lt("data_vencimento", "2024-01-15"));
        assert!(overdue.matches(&doc));

        let search = Filter::Or(vec![
            Filter::contains("cliente_nome", "souza"),
            Filter::contains("numero_venda", "souza"),
        ]);
        assert!(search.matches(&doc));

        assert!(!Filter::gt("valor", 150).matches(&doc));
        assert!(Filter::gt("valor", 99.5).matches(&doc));
    }

    #[test]
    fn and_with_all_collapses() {
        let f = Filter::All.and(Filter::eq("status", "ativo"));
        assert_eq!(f, Filter::eq("status", "ativo"));
    }

    #[test]
    fn stamp_new_keeps_given_id() {
        let id = Uuid::new_v4();
        let (stamped_id, doc) = stamp_new(json!({ "id": id.to_string(), "nome": "x" })).unwrap();
        assert_eq!(stamped_id, id);
        assert!(doc.get("created_date").is_some());
    }
}
