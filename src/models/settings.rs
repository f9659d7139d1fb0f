// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::{Entity, EntityKind};

/// Dados da empresa usados no cabeçalho dos documentos. Um por conta.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Configuracao {
    pub id: Uuid,

    #[schema(example = "Minha Loja Ltda")]
    #[serde(default)]
    pub nome_empresa: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    #[serde(default)]
    pub cnpj: Option<String>,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    #[serde(default)]
    pub endereco: Option<String>,

    #[schema(example = "(11) 99999-8888")]
    #[serde(default)]
    pub telefone: Option<String>,

    #[schema(example = "contato@minhaloja.com")]
    #[serde(default)]
    pub email: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    #[serde(default)]
    pub chave_pix: Option<String>,

    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Configuracao {
    const KIND: EntityKind = EntityKind::Configuracao;
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AtualizarConfiguracao {
    #[schema(example = "Minha Nova Loja")]
    pub nome_empresa: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub cnpj: Option<String>,

    #[schema(example = "Av. Paulista, 1000")]
    pub endereco: Option<String>,

    pub telefone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    #[schema(example = "chave@pix.com.br")]
    pub chave_pix: Option<String>,
}

/// Configurações da plataforma, mantidas pelo admin
/// (`CHAVE_PIX`, `NOME_BANCO_PIX`, `NOME_TITULAR_PIX`, `VALOR_MENSALIDADE`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfiguracaoPublica {
    pub id: Uuid,
    pub chave: String,
    pub valor: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for ConfiguracaoPublica {
    const KIND: EntityKind = EntityKind::ConfiguracaoPublica;
}

pub const CHAVE_PIX: &str = "CHAVE_PIX";
pub const NOME_BANCO_PIX: &str = "NOME_BANCO_PIX";
pub const NOME_TITULAR_PIX: &str = "NOME_TITULAR_PIX";
pub const VALOR_MENSALIDADE: &str = "VALOR_MENSALIDADE";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct DefinirConfiguracaoPublica {
    #[validate(length(min = 1, message = "A chave é obrigatória."))]
    #[schema(example = "VALOR_MENSALIDADE")]
    pub chave: String,
    #[schema(example = "49.90")]
    pub valor: String,
}
