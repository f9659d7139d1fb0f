// src/services/import_service.rs

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{EntityKind, Repository},
    events::{DomainEvent, EventBus},
    models::{
        crm::{Cliente, NovoCliente},
        import::{ImportacaoPayload, ImportacaoResultado},
        inventory::{NovoProduto, Produto},
    },
};

const STATUS_SUCESSO: &str = "success";

/// Converte as linhas extraídas no payload de criação e valida cada uma.
/// Uma linha inválida barra a importação inteira, antes de qualquer gravação.
pub fn converter_linhas<P>(registros: Vec<Value>) -> Result<Vec<P>, AppError>
where
    P: DeserializeOwned + Validate,
{
    registros
        .into_iter()
        .map(|linha| {
            let payload: P = serde_json::from_value(linha)?;
            payload.validate()?;
            Ok(payload)
        })
        .collect()
}

#[derive(Clone)]
pub struct ImportService {
    clientes: Repository<Cliente>,
    produtos: Repository<Produto>,
    events: EventBus,
}

impl ImportService {
    pub fn new(clientes: Repository<Cliente>, produtos: Repository<Produto>, events: EventBus) -> Self {
        Self { clientes, produtos, events }
    }

    /// `entidade` chega como texto da rota e é resolvido no enum fechado.
    pub async fn importar(
        &self,
        owner: &str,
        entidade: &str,
        payload: ImportacaoPayload,
    ) -> Result<ImportacaoResultado, AppError> {
        let kind: EntityKind = entidade.parse()?;

        if payload.status != STATUS_SUCESSO {
            return Err(AppError::BusinessRule("importacao.falhou"));
        }
        let registros = payload.output.map(|o| o.registros).unwrap_or_default();
        if registros.is_empty() {
            return Err(AppError::BusinessRule("importacao.vazia"));
        }

        let importados = match kind {
            EntityKind::Cliente => {
                self.gravar::<Cliente, NovoCliente>(&self.clientes, owner, registros).await?
            }
            EntityKind::Produto => {
                self.gravar::<Produto, NovoProduto>(&self.produtos, owner, registros).await?
            }
            outro => return Err(AppError::EntityNotImportable(outro.to_string())),
        };

        tracing::info!("📥 {} registros de {} importados para {}", importados, kind, owner);
        self.events.publish(DomainEvent::ImportCompleted {
            owner: owner.to_string(),
            kind,
            quantidade: importados,
        });

        Ok(ImportacaoResultado { entidade: kind, importados })
    }

    async fn gravar<T, P>(
        &self,
        repo: &Repository<T>,
        owner: &str,
        registros: Vec<Value>,
    ) -> Result<usize, AppError>
    where
        T: crate::db::Entity,
        P: DeserializeOwned + Validate + Serialize,
    {
        let linhas: Vec<P> = converter_linhas(registros)?;
        repo.bulk_create(owner, &linhas).await?;
        Ok(linhas.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{owned_by, MemoryStore},
        models::import::SaidaExtracao,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> (ImportService, Repository<Cliente>, Repository<Produto>) {
        let store = Arc::new(MemoryStore::new());
        let clientes = Repository::new(store.clone());
        let produtos = Repository::new(store);
        (
            ImportService::new(clientes.clone(), produtos.clone(), EventBus::default()),
            clientes,
            produtos,
        )
    }

    fn extracao(registros: Vec<Value>) -> ImportacaoPayload {
        ImportacaoPayload { status: "success".into(), output: Some(SaidaExtracao { registros }) }
    }

    #[tokio::test]
    async fn imports_clients_for_the_owner() {
        let (service, clientes, _) = service();
        let payload = extracao(vec![
            json!({ "nome_completo": "Maria Souza", "telefone": "11999990000" }),
            json!({ "nome_completo": "João Lima", "estado": "SP" }),
        ]);

        let resultado = service.importar("ana@loja.com", "cliente", payload).await.unwrap();
        assert_eq!(resultado.importados, 2);
        assert_eq!(resultado.entidade, EntityKind::Cliente);
        assert_eq!(clientes.count(&owned_by("ana@loja.com")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn imports_products_with_defaults() {
        let (service, _, produtos) = service();
        let payload = extracao(vec![json!({ "nome_produto": "Caneta", "preco_venda": 2.5 })]);

        service.importar("ana@loja.com", "Produto", payload).await.unwrap();
        let salvos = produtos.filter(&owned_by("ana@loja.com"), None, Default::default()).await.unwrap();
        assert_eq!(salvos[0].unidade, "un");
        assert_eq!(salvos[0].quantidade_estoque, 0);
    }

    #[tokio::test]
    async fn rejects_unknown_and_non_importable_entities() {
        let (service, _, _) = service();
        let err = service.importar("ana@loja.com", "Fornecedor", extracao(vec![json!({})])).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownEntity(_)));

        let err = service.importar("ana@loja.com", "Venda", extracao(vec![json!({})])).await.unwrap_err();
        assert!(matches!(err, AppError::EntityNotImportable(_)));
    }

    #[tokio::test]
    async fn failed_or_empty_extraction_is_rejected() {
        let (service, _, _) = service();
        let falhou = ImportacaoPayload { status: "error".into(), output: None };
        let err = service.importar("ana@loja.com", "Cliente", falhou).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("importacao.falhou")));

        let err = service.importar("ana@loja.com", "Cliente", extracao(vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule("importacao.vazia")));
    }

    #[tokio::test]
    async fn one_invalid_row_blocks_the_whole_import() {
        let (service, clientes, _) = service();
        let payload = extracao(vec![
            json!({ "nome_completo": "Maria Souza" }),
            json!({ "nome_completo": "" }),
        ]);

        let err = service.importar("ana@loja.com", "Cliente", payload).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(clientes.count(&owned_by("ana@loja.com")).await.unwrap(), 0);
    }
}
