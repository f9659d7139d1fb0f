// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::{Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Usuario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Ativo,
    Inativo,
    Bloqueado,
}

// Representa um usuário vindo do entity store.
// Nunca sai da API diretamente: use `UserProfile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(default)]
    pub aceitou_termos: bool,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub nome_empresa: Option<String>,
    #[serde(default)]
    pub ultimo_logout: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Usuario {
    const KIND: EntityKind = EntityKind::Usuario;
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Gravado no registro do usuário
#[derive(Debug, Serialize)]
pub struct NovoUsuario {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub aceitou_termos: bool,
}

/// O que a API devolve sobre um usuário (sem o hash da senha).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub aceitou_termos: bool,
    pub telefone: Option<String>,
    pub nome_empresa: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl From<Usuario> for UserProfile {
    fn from(u: Usuario) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
            status: u.status,
            aceitou_termos: u.aceitou_termos,
            telefone: u.telefone,
            nome_empresa: u.nome_empresa,
            created_date: u.created_date,
        }
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: String,
    #[serde(default)]
    pub aceitou_termos: bool,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

/// `PATCH /api/users/me`. Só os campos informados são alterados.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: Option<String>,
    pub telefone: Option<String>,
    pub nome_empresa: Option<String>,
    pub aceitou_termos: Option<bool>,
}

/// Alterações que só o admin pode fazer num usuário.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateUserPayload {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
    // Emissão em microssegundos, comparada com o último logout
    pub iat_micros: i64,
}
