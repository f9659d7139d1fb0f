// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro de domínio. Os serviços só conhecem este tipo;
// a tradução para HTTP (e idioma) acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação local (carrinho vazio, cliente não selecionado...).
    // Barrada antes de qualquer chamada ao entity store.
    #[error("Regra de negócio: {0}")]
    BusinessRule(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Permissão necessária: {0}")]
    Forbidden(&'static str),

    #[error("Mensalidade pendente")]
    SubscriptionOverdue,

    #[error("Entidade desconhecida: {0}")]
    UnknownEntity(String),

    #[error("Entidade não importável: {0}")]
    EntityNotImportable(String),

    // Operação composta interrompida no meio do caminho.
    // Os passos em `committed` já foram gravados e NÃO são desfeitos.
    #[error("Operação '{operation}' concluída parcialmente: {cause}")]
    PartialFailure {
        operation: &'static str,
        committed: Vec<String>,
        cause: String,
    },

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar documento: {0}")]
    DocumentRender(String),
}

// O corpo de erro que vai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BusinessRule(_)
            | AppError::UnknownEntity(_)
            | AppError::EntityNotImportable(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::SubscriptionOverdue => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => i18n.translate(lang, &e.code),
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status,
                    error: i18n.translate(lang, "erro.validacao"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::BusinessRule(key) => ApiError {
                status,
                error: i18n.translate(lang, key),
                details: None,
            },
            AppError::ResourceNotFound(what) => ApiError {
                status,
                error: i18n.translate(lang, "erro.nao_encontrado"),
                details: Some(json!({ "recurso": what })),
            },
            AppError::Forbidden(permission) => ApiError {
                status,
                error: i18n.translate(lang, "erro.permissao"),
                details: Some(json!({ "permissao": permission })),
            },
            AppError::UnknownEntity(name) | AppError::EntityNotImportable(name) => ApiError {
                status,
                error: i18n.translate(lang, "erro.entidade"),
                details: Some(json!({ "entidade": name })),
            },
            AppError::PartialFailure { operation, committed, cause } => {
                tracing::error!(
                    "🔥 Operação '{}' interrompida após {:?}: {}",
                    operation, committed, cause
                );
                ApiError {
                    status,
                    error: i18n.translate(lang, "erro.parcial"),
                    details: Some(json!({
                        "operacao": operation,
                        "concluido": committed,
                        "causa": cause,
                    })),
                }
            }
            AppError::EmailAlreadyExists => simple(status, i18n.translate(lang, "erro.email_existe")),
            AppError::InvalidCredentials => simple(status, i18n.translate(lang, "erro.credenciais")),
            AppError::InvalidToken => simple(status, i18n.translate(lang, "erro.token")),
            AppError::UserNotFound => simple(status, i18n.translate(lang, "erro.usuario")),
            AppError::SubscriptionOverdue => simple(status, i18n.translate(lang, "erro.mensalidade")),

            // Todos os outros erros viram 500.
            // O `tracing` loga a mensagem detalhada que o `thiserror` nos deu.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                simple(status, i18n.translate(lang, "erro.interno"))
            }
        }
    }
}

fn simple(status: StatusCode, error: String) -> ApiError {
    ApiError { status, error, details: None }
}

// Usado pelos middlewares, que não têm o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_keeps_committed_steps_in_details() {
        let err = AppError::PartialFailure {
            operation: "registrar_venda",
            committed: vec!["venda".into(), "parcelas".into()],
            cause: "timeout".into(),
        };

        let api = err.to_api_error(&Locale("pt".into()), &I18nStore::default());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        let details = api.details.expect("details");
        assert_eq!(details["concluido"], json!(["venda", "parcelas"]));
    }

    #[test]
    fn business_rule_is_translated() {
        let api = AppError::BusinessRule("venda.carrinho_vazio")
            .to_api_error(&Locale("en".into()), &I18nStore::default());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "The cart is empty.");
    }

    #[test]
    fn overdue_subscription_maps_to_payment_required() {
        assert_eq!(AppError::SubscriptionOverdue.status(), StatusCode::PAYMENT_REQUIRED);
    }
}
