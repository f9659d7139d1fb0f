// src/db/memory_store.rs

use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{
        compare_values, stamp_new, EntityKind, EntityStore, Filter, Page, SortSpec, IMMUTABLE_FIELDS,
    },
};

/// Entity store em memória. Usado quando não há DATABASE_URL e nos testes.
/// Mantém a ordem de inserção por tipo de entidade.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn sort_records(records: &mut [Value], sort: &SortSpec) {
    records.sort_by(|a, b| {
        let ord = match (a.get(&sort.field), b.get(&sort.field)) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            // Registros sem o campo vão para o fim
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if sort.descending { ord.reverse() } else { ord }
    });
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn filter(
        &self,
        kind: EntityKind,
        predicate: &Filter,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<Value>, AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| predicate.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        if let Some(sort) = sort {
            sort_records(&mut rows, sort);
        }

        let offset = page.offset.unwrap_or(0).max(0) as usize;
        let limit = page.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, kind: EntityKind, predicate: &Filter) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        let count = tables
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| predicate.matches(r)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Value>, AppError> {
        let id = id.to_string();
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|r| record_id(r) == Some(id.as_str())))
            .cloned())
    }

    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, AppError> {
        let (_, record) = stamp_new(fields)?;
        let mut tables = self.tables.write().await;
        tables.entry(kind).or_default().push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: Uuid, partial: Value) -> Result<Value, AppError> {
        let patch = match partial {
            Value::Object(map) => map,
            _ => return Err(anyhow::anyhow!("update precisa de um objeto JSON").into()),
        };
        let id_str = id.to_string();

        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r) == Some(id_str.as_str())))
            .ok_or_else(|| AppError::ResourceNotFound(format!("{} {}", kind, id)))?;

        if let Value::Object(obj) = record {
            for (key, value) in patch {
                if IMMUTABLE_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                obj.insert(key, value);
            }
            obj.insert(
                "updated_date".into(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        Ok(record.clone())
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<(), AppError> {
        let id_str = id.to_string();
        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|r| record_id(r) != Some(id_str.as_str()));
        if rows.len() == before {
            return Err(AppError::ResourceNotFound(format!("{} {}", kind, id)));
        }
        Ok(())
    }

    async fn bulk_create(&self, kind: EntityKind, records: Vec<Value>) -> Result<(), AppError> {
        // Carimba tudo antes de gravar: ou entram todos, ou nenhum.
        let stamped = records
            .into_iter()
            .map(|r| stamp_new(r).map(|(_, doc)| doc))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.tables.write().await;
        tables.entry(kind).or_default().extend(stamped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_filter_sort_and_paginate() {
        let store = MemoryStore::new();
        for (nome, preco) in [("Caneta", 2.5), ("Caderno", 15.0), ("Borracha", 1.0)] {
            store
                .create(EntityKind::Produto, json!({ "nome_produto": nome, "preco_venda": preco }))
                .await
                .unwrap();
        }

        let sorted = store
            .list(EntityKind::Produto, Some(&SortSpec::desc("preco_venda")), Page::new(2, 0))
            .await
            .unwrap();
        let nomes: Vec<&str> = sorted.iter().map(|p| p["nome_produto"].as_str().unwrap()).collect();
        assert_eq!(nomes, vec!["Caderno", "Caneta"]);

        let second_page = store
            .list(EntityKind::Produto, Some(&SortSpec::desc("preco_venda")), Page::new(2, 2))
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0]["nome_produto"], "Borracha");

        let count = store
            .count(EntityKind::Produto, &Filter::gt("preco_venda", 2))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn update_merges_and_protects_metadata() {
        let store = MemoryStore::new();
        let created = store
            .create(EntityKind::Cliente, json!({ "nome_completo": "Ana", "created_by": "dono@loja.com" }))
            .await
            .unwrap();
        let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();

        let updated = store
            .update(EntityKind::Cliente, id, json!({ "telefone": "11999990000", "created_by": "outro@x.com" }))
            .await
            .unwrap();

        assert_eq!(updated["nome_completo"], "Ana");
        assert_eq!(updated["telefone"], "11999990000");
        assert_eq!(updated["created_by"], "dono@loja.com");
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(EntityKind::Venda, Uuid::new_v4(), json!({ "status": "pago" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn bulk_create_and_delete() {
        let store = MemoryStore::new();
        store
            .bulk_create(
                EntityKind::Parcela,
                vec![json!({ "numero_parcela": 1 }), json!({ "numero_parcela": 2 })],
            )
            .await
            .unwrap();
        let rows = store.list(EntityKind::Parcela, None, Page::default()).await.unwrap();
        assert_eq!(rows.len(), 2);

        let id = Uuid::parse_str(rows[0]["id"].as_str().unwrap()).unwrap();
        store.delete(EntityKind::Parcela, id).await.unwrap();
        assert_eq!(store.count(EntityKind::Parcela, &Filter::All).await.unwrap(), 1);
    }
}
