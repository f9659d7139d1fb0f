// src/db/repository.rs

use std::{marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{EntityKind, EntityStore, Filter, Page, SortSpec},
};

/// Um tipo de registro persistido no entity store.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
}

/// Repositório tipado sobre o entity store.
/// Converte documentos JSON em structs e carimba o dono (`created_by`).
pub struct Repository<T> {
    store: Arc<dyn EntityStore>,
    _marker: PhantomData<fn() -> T>,
}

// `derive(Clone)` exigiria `T: Clone`
impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), _marker: PhantomData }
    }
}

/// Filtro padrão de dono dos registros de uma conta.
pub fn owned_by(owner: &str) -> Filter {
    Filter::eq("created_by", owner)
}

fn decode<T: Entity>(doc: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(doc)?)
}

fn to_object(fields: &impl Serialize) -> Result<serde_json::Map<String, Value>, AppError> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!("esperado um objeto JSON, recebido {}", other).into()),
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store, _marker: PhantomData }
    }

    pub async fn filter(
        &self,
        predicate: &Filter,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<T>, AppError> {
        self.store
            .filter(T::KIND, predicate, sort, page)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn list_owned(
        &self,
        owner: &str,
        sort: Option<&SortSpec>,
        page: Page,
    ) -> Result<Vec<T>, AppError> {
        self.filter(&owned_by(owner), sort, page).await
    }

    pub async fn count(&self, predicate: &Filter) -> Result<i64, AppError> {
        self.store.count(T::KIND, predicate).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, AppError> {
        self.store.get(T::KIND, id).await?.map(decode).transpose()
    }

    /// Como `get`, mas ausência vira `ResourceNotFound`.
    pub async fn find(&self, id: Uuid) -> Result<T, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("{} {}", T::KIND, id)))
    }

    /// Busca um registro garantindo que pertence ao dono.
    /// Registro de outra conta responde como inexistente.
    pub async fn find_owned(&self, owner: &str, id: Uuid) -> Result<T, AppError> {
        let doc = self
            .store
            .get(T::KIND, id)
            .await?
            .filter(|doc| owned_by(owner).matches(doc))
            .ok_or_else(|| AppError::ResourceNotFound(format!("{} {}", T::KIND, id)))?;
        decode(doc)
    }

    pub async fn create(&self, owner: &str, fields: &impl Serialize) -> Result<T, AppError> {
        let mut doc = to_object(fields)?;
        doc.insert("created_by".into(), Value::String(owner.to_string()));
        decode(self.store.create(T::KIND, Value::Object(doc)).await?)
    }

    /// Merge raso. Campos `null` no patch são ignorados.
    pub async fn update(&self, id: Uuid, patch: &impl Serialize) -> Result<T, AppError> {
        let mut doc = to_object(patch)?;
        doc.retain(|_, v| !v.is_null());
        decode(self.store.update(T::KIND, id, Value::Object(doc)).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete(T::KIND, id).await
    }

    pub async fn bulk_create<P: Serialize>(&self, owner: &str, rows: &[P]) -> Result<(), AppError> {
        let docs = rows
            .iter()
            .map(|row| {
                let mut doc = to_object(row)?;
                doc.insert("created_by".into(), Value::String(owner.to_string()));
                Ok(Value::Object(doc))
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        self.store.bulk_create(T::KIND, docs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Nota {
        id: Uuid,
        texto: String,
        created_by: String,
        #[serde(default)]
        lida: Option<bool>,
    }

    impl Entity for Nota {
        const KIND: EntityKind = EntityKind::ChatMessage;
    }

    #[derive(Serialize)]
    struct NovaNota<'a> {
        texto: &'a str,
    }

    #[derive(Serialize)]
    struct NotaPatch {
        texto: Option<String>,
        lida: Option<bool>,
    }

    fn repo() -> Repository<Nota> {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_stamps_owner_and_scopes_reads() {
        let repo = repo();
        let nota = repo.create("ana@loja.com", &NovaNota { texto: "oi" }).await.unwrap();
        repo.create("bia@loja.com", &NovaNota { texto: "olá" }).await.unwrap();

        assert_eq!(nota.created_by, "ana@loja.com");
        let minhas = repo.list_owned("ana@loja.com", None, Page::default()).await.unwrap();
        assert_eq!(minhas.len(), 1);

        let err = repo.find_owned("bia@loja.com", nota.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn update_ignores_null_fields() {
        let repo = repo();
        let nota = repo.create("ana@loja.com", &NovaNota { texto: "oi" }).await.unwrap();

        let nota = repo
            .update(nota.id, &NotaPatch { texto: None, lida: Some(true) })
            .await
            .unwrap();

        assert_eq!(nota.texto, "oi");
        assert_eq!(nota.lida, Some(true));
    }
}
