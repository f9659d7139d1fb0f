// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Extrator de idioma a partir do Accept-Language
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale("pt".to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            });

        Ok(lang.map(Locale).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extrair(accept_language: Option<&str>) -> String {
        let mut builder = Request::builder();
        if let Some(valor) = accept_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, valor);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let Ok(Locale(lang)) = Locale::from_request_parts(&mut parts, &()).await;
        lang
    }

    #[tokio::test]
    async fn usa_o_primeiro_idioma_sem_regiao() {
        assert_eq!(extrair(Some("en-US,en;q=0.9,pt;q=0.5")).await, "en");
        assert_eq!(extrair(Some("PT-BR")).await, "pt");
    }

    #[tokio::test]
    async fn sem_cabecalho_cai_no_portugues() {
        assert_eq!(extrair(None).await, "pt");
    }
}
