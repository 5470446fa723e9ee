// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Nosso extrator de idioma
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale("en".to_string())
    }
}

impl Locale {
    /// Lê o primeiro idioma do cabeçalho Accept-Language ("pt-BR" -> "pt").
    pub fn from_header(header_str: &str) -> Option<Self> {
        accept_language::parse(header_str)
            .first()
            .map(|tag_string| {
                tag_string
                    .split('-')
                    .next()
                    .unwrap_or(tag_string)
                    .to_lowercase()
            })
            .filter(|lang| !lang.is_empty())
            .map(Locale)
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
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}
