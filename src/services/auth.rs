// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, Page, Repository, SortSpec},
    models::auth::{
        AdminUpdateUserPayload, Claims, LoginUserPayload, NovoUsuario, RegisterUserPayload,
        UpdateMePayload, UserRole, UserStatus, Usuario,
    },
};

#[derive(Serialize)]
struct MarcaLogout {
    ultimo_logout: chrono::DateTime<Utc>,
}

fn normalizar_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    usuarios: Repository<Usuario>,
    jwt_secret: String,
    admin_emails: Vec<String>,
}

impl AuthService {
    pub fn new(usuarios: Repository<Usuario>, jwt_secret: String, admin_emails: Vec<String>) -> Self {
        let admin_emails = admin_emails.iter().map(|e| normalizar_email(e)).collect();
        Self { usuarios, jwt_secret, admin_emails }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Usuario>, AppError> {
        Ok(self
            .usuarios
            .filter(&Filter::eq("email", email), None, Page::limit(1))
            .await?
            .into_iter()
            .next())
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<String, AppError> {
        let email = normalizar_email(&payload.email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing fora do runtime assíncrono
        let password = payload.password;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let role = if self.admin_emails.contains(&email) {
            UserRole::Admin
        } else {
            UserRole::Usuario
        };

        // O dono do registro de usuário é o próprio usuário
        let usuario = self
            .usuarios
            .create(
                &email,
                &NovoUsuario {
                    email: email.clone(),
                    full_name: payload.full_name.trim().to_string(),
                    password_hash,
                    role,
                    status: UserStatus::Ativo,
                    aceitou_termos: payload.aceitou_termos,
                },
            )
            .await?;

        tracing::info!("🆕 Usuário registrado: {} ({:?})", usuario.email, usuario.role);
        self.create_token(usuario.id)
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<String, AppError> {
        let usuario = self
            .find_by_email(&normalizar_email(&payload.email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = usuario.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {}", usuario.email);
        self.create_token(usuario.id)
    }

    /// Decodifica o token e carrega o usuário.
    /// Tokens emitidos até o último logout são recusados.
    pub async fn validate_token(&self, token: &str) -> Result<Usuario, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let usuario = self
            .usuarios
            .get(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(logout) = usuario.ultimo_logout {
            if token_data.claims.iat_micros <= logout.timestamp_micros() {
                return Err(AppError::InvalidToken);
            }
        }
        Ok(usuario)
    }

    pub async fn update_me(&self, usuario: &Usuario, patch: &UpdateMePayload) -> Result<Usuario, AppError> {
        self.usuarios.update(usuario.id, patch).await
    }

    pub async fn logout(&self, usuario: &Usuario) -> Result<(), AppError> {
        self.usuarios
            .update(usuario.id, &MarcaLogout { ultimo_logout: Utc::now() })
            .await?;
        tracing::info!("👋 Logout de {}", usuario.email);
        Ok(())
    }

    // --- Administração de usuários ---

    pub async fn listar_usuarios(&self) -> Result<Vec<Usuario>, AppError> {
        self.usuarios
            .filter(&Filter::All, Some(&SortSpec::asc("email")), Page::default())
            .await
    }

    pub async fn obter_usuario(&self, usuario_id: Uuid) -> Result<Usuario, AppError> {
        self.usuarios.get(usuario_id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn admin_update(
        &self,
        usuario_id: Uuid,
        patch: &AdminUpdateUserPayload,
    ) -> Result<Usuario, AppError> {
        let usuario = self.obter_usuario(usuario_id).await?;
        let atualizado = self.usuarios.update(usuario.id, patch).await?;
        tracing::info!(
            "🛡️ Usuário {} atualizado pelo admin: {:?} / {:?}",
            atualizado.email, atualizado.role, atualizado.status
        );
        Ok(atualizado)
    }

    pub async fn definir_status(&self, usuario_id: Uuid, status: UserStatus) -> Result<Usuario, AppError> {
        self.admin_update(usuario_id, &AdminUpdateUserPayload { role: None, status: Some(status) })
            .await
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            iat_micros: now.timestamp_micros(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    fn service() -> AuthService {
        AuthService::new(
            Repository::new(Arc::new(MemoryStore::new())),
            "segredo-de-teste".into(),
            vec!["Admin@Gestao.com".into()],
        )
    }

    fn registro(email: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.into(),
            password: "senha123".into(),
            full_name: "Ana Lima".into(),
            aceitou_termos: true,
        }
    }

    #[tokio::test]
    async fn register_login_and_validate() {
        let service = service();
        let token = service.register_user(registro("ana@loja.com")).await.unwrap();

        let usuario = service.validate_token(&token).await.unwrap();
        assert_eq!(usuario.email, "ana@loja.com");
        assert_eq!(usuario.role, UserRole::Usuario);
        assert_eq!(usuario.status, UserStatus::Ativo);
        assert_eq!(usuario.created_by, "ana@loja.com");

        let login = LoginUserPayload { email: " ANA@loja.com ".into(), password: "senha123".into() };
        assert!(service.login_user(login).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_and_wrong_password_are_rejected() {
        let service = service();
        service.register_user(registro("ana@loja.com")).await.unwrap();

        let err = service.register_user(registro("ana@loja.com")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));

        let login = LoginUserPayload { email: "ana@loja.com".into(), password: "errada".into() };
        assert!(matches!(service.login_user(login).await.unwrap_err(), AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn configured_admin_email_gets_admin_role() {
        let service = service();
        let token = service.register_user(registro("admin@gestao.com")).await.unwrap();
        assert!(service.validate_token(&token).await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn logout_revokes_previous_tokens() {
        let service = service();
        let antigo = service.register_user(registro("ana@loja.com")).await.unwrap();
        let usuario = service.validate_token(&antigo).await.unwrap();

        service.logout(&usuario).await.unwrap();
        assert!(matches!(service.validate_token(&antigo).await.unwrap_err(), AppError::InvalidToken));

        let login = LoginUserPayload { email: "ana@loja.com".into(), password: "senha123".into() };
        let novo = service.login_user(login).await.unwrap();
        assert!(service.validate_token(&novo).await.is_ok());
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let err = service().validate_token("nao.e.jwt").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
