// src/services/auth.rs

use async_trait::async_trait;
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SessionRepository, UserRepository},
    models::auth::{AuthSession, Claims, Credentials},
};

/// Provedor de autenticação: verifica credenciais, emite e revoga sessões.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(None)` quando as credenciais não conferem (ou a conta está desativada).
    async fn sign_in(&self, credentials: &Credentials) -> Result<Option<AuthSession>, AppError>;

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError>;
}

/// Sessão autenticada extraída de um token válido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_repo: SessionRepository,
    jwt_secret: String,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        session_repo: SessionRepository,
        jwt_secret: String,
        session_ttl: Duration,
    ) -> Self {
        Self { user_repo, session_repo, jwt_secret, session_ttl }
    }

    /// Valida assinatura, expiração e se a sessão ainda não foi revogada.
    pub async fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = decode_claims(&self.jwt_secret, token)?;

        let active = self.session_repo.is_active(claims.sid, claims.sub).await?;
        if !active {
            return Err(AppError::SessionRevoked);
        }

        Ok(SessionClaims { user_id: claims.sub, session_id: claims.sid })
    }
}

#[async_trait]
impl AuthProvider for AuthService {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Option<AuthSession>, AppError> {
        let Some(user) = self.user_repo.find_by_email(&credentials.email).await? else {
            return Ok(None);
        };

        let password_clone = credentials.password.clone();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        // Conta desativada recebe a mesma resposta que senha errada
        if !is_password_valid || !user.is_active {
            return Ok(None);
        }

        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        self.session_repo.create(session_id, user.id, expires_at).await?;

        let claims = Claims {
            sub: user.id,
            sid: session_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode_claims(&self.jwt_secret, &claims)?;

        tracing::info!(user_id = %user.id, %session_id, "Sessão emitida.");

        Ok(Some(AuthSession { session_id, user_id: user.id, token }))
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        self.session_repo.revoke(session_id).await
    }
}

pub fn encode_claims(secret: &str, claims: &Claims) -> Result<String, AppError> {
    // Usa '?' para um tratamento de erro mais limpo
    Ok(encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}
