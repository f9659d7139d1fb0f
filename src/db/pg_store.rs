// src/db/pg_store.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{stamp_new, EntityKind, EntityStore, Filter, Page, SortSpec, IMMUTABLE_FIELDS},
};

/// Entity store sobre Postgres. Cada registro é uma linha da tabela
/// `entities` com o documento inteiro numa coluna JSONB.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapa os curingas do ILIKE para que o termo seja tratado como literal.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// Traduz o predicado para SQL. Nomes de campo e valores sempre vão como bind.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(field, Value::Null) => {
            qb.push("(data -> ");
            qb.push_bind(field.clone());
            qb.push(" IS NULL OR data -> ");
            qb.push_bind(field.clone());
            qb.push(" = 'null'::jsonb)");
        }
        Filter::Eq(field, value) => {
            qb.push("data -> ");
            qb.push_bind(field.clone());
            qb.push(" = ");
            qb.push_bind(Json(value.clone()));
        }
        Filter::Contains(field, term) => {
            qb.push("data ->> ");
            qb.push_bind(field.clone());
            qb.push(" ILIKE ");
            qb.push_bind(like_pattern(term));
        }
        Filter::Lt(field, bound) => {
            qb.push("data -> ");
            qb.push_bind(field.clone());
            qb.push(" < ");
            qb.push_bind(Json(bound.clone()));
        }
        Filter::Gt(field, bound) => {
            qb.push("data -> ");
            qb.push_bind(field.clone());
            qb.push(" > ");
            qb.push_bind(Json(bound.clone()));
        }
        Filter::And(parts) | Filter::Or(parts) if parts.is_empty() => {
            qb.push(if matches!(filter, Filter::And(_)) { "TRUE" } else { "FALSE" });
        }
        Filter::And(parts) | Filter::Or(parts) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            qb.push("(");
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_filter(qb, part);
            }
            qb.push(")");
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, kind: EntityKind, predicate: &Filter) {
    qb.push(" WHERE kind = ");
    qb.push_bind(kind.as_str());
    qb.push(" AND ");
    push_filter(qb, predicate);
}

#[async_trait]
impl EntityStore for PgStore {
    async fn filter(
        &self,
        kind: EntityKind,
        predicate: &Filter,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<Value>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT data FROM entities");
        push_where(&mut qb, kind, predicate);

        qb.push(" ORDER BY ");
        if let Some(sort) = sort {
            qb.push("data -> ");
            qb.push_bind(sort.field.clone());
            qb.push(if sort.descending { " DESC, " } else { " ASC, " });
        }
        qb.push("seq ASC");

        if let Some(limit) = page.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit.max(0));
        }
        if let Some(offset) = page.offset {
            qb.push(" OFFSET ");
            qb.push_bind(offset.max(0));
        }

        let rows = qb
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn count(&self, kind: EntityKind, predicate: &Filter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM entities");
        push_where(&mut qb, kind, predicate);

        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Value>, AppError> {
        let row = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT data FROM entities WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, AppError> {
        let (id, doc) = stamp_new(fields)?;

        let Json(saved) = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            INSERT INTO entities (id, kind, data)
            VALUES ($1, $2, $3)
            RETURNING data
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(Json(doc))
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn update(&self, kind: EntityKind, id: Uuid, partial: Value) -> Result<Value, AppError> {
        let mut patch = match partial {
            Value::Object(map) => map,
            _ => return Err(anyhow::anyhow!("update precisa de um objeto JSON").into()),
        };
        for field in IMMUTABLE_FIELDS {
            patch.remove(field);
        }
        patch.insert(
            "updated_date".into(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        // `||` faz o merge raso do JSONB: campos do patch sobrescrevem os atuais
        let saved = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            UPDATE entities
            SET data = data || $3, updated_at = NOW()
            WHERE kind = $1 AND id = $2
            RETURNING data
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .fetch_optional(&self.pool)
        .await?;

        saved
            .map(|Json(doc)| doc)
            .ok_or_else(|| AppError::ResourceNotFound(format!("{} {}", kind, id)))
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("{} {}", kind, id)));
        }
        Ok(())
    }

    async fn bulk_create(&self, kind: EntityKind, records: Vec<Value>) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        let stamped = records
            .into_iter()
            .map(stamp_new)
            .collect::<Result<Vec<_>, _>>()?;

        // Um único INSERT multi-linha: o lote entra inteiro ou não entra.
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO entities (id, kind, data) ");
        qb.push_values(stamped, |mut row, (id, doc)| {
            row.push_bind(id)
                .push_bind(kind.as_str())
                .push_bind(Json(doc));
        });

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}
