// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{UserRole, Usuario},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
    fn allows(role: UserRole) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Extrai Usuário (colocado pelo auth_guard)
        let role = parts
            .extensions
            .get::<Usuario>()
            .map(|u| u.role)
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Confere o papel contra a permissão exigida
        if !T::allows(role) {
            tracing::warn!("🚫 Acesso negado: papel {:?} sem a permissão '{}'", role, T::slug());
            return Err(AppError::Forbidden(T::slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

/// Console do administrador da plataforma.
pub struct PermAdmin;
impl PermissionDef for PermAdmin {
    fn slug() -> &'static str { "admin" }
    fn allows(role: UserRole) -> bool { role == UserRole::Admin }
}
