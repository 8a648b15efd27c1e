//! Login and password management for readers and librarians

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::account::{birth_date_password, Claims, Credentials, Role},
    repository::Repository,
};

/// Account summary returned on login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by account ID and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, AccountInfo)> {
        let username = username.trim();
        let (credentials, role) = self
            .find_account(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(&credentials, password)? {
            tracing::info!("Failed login attempt for {}", username);
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.issue_token(&credentials, role)?;
        tracing::info!("{} {} logged in", role, credentials.id);

        Ok((
            token,
            AccountInfo {
                id: credentials.id,
                name: credentials.name,
                role,
                date_of_birth: credentials.birth_date,
            },
        ))
    }

    /// Set the caller's own password after checking the current one
    pub async fn change_password(
        &self,
        claims: &Claims,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let credentials = match claims.role {
            Role::Reader => self.repository.readers.get_credentials(&claims.sub).await?,
            Role::Librarian => self.repository.librarians.get_credentials(&claims.sub).await?,
        }
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", claims.sub)))?;

        if !verify_password(&credentials, current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }

        let hash = hash_password(new_password)?;
        match claims.role {
            Role::Reader => self.repository.readers.set_password(&claims.sub, &hash).await?,
            Role::Librarian => self.repository.librarians.set_password(&claims.sub, &hash).await?,
        }

        tracing::info!("Password changed for {} {}", claims.role, claims.sub);
        Ok(())
    }

    async fn find_account(&self, id: &str) -> AppResult<Option<(Credentials, Role)>> {
        if let Some(reader) = self.repository.readers.get_credentials(id).await? {
            return Ok(Some((reader, Role::Reader)));
        }
        let librarian = self.repository.librarians.get_credentials(id).await?;
        Ok(librarian.map(|l| (l, Role::Librarian)))
    }

    fn issue_token(&self, credentials: &Credentials, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: credentials.id.clone(),
            name: credentials.name.clone(),
            role,
            exp: (now + Duration::hours(self.config.jwt_expiration_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }
}

/// A stored argon2 hash takes precedence over the birth date password
fn verify_password(credentials: &Credentials, password: &str) -> AppResult<bool> {
    if let Some(ref hash) = credentials.password {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        return Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok());
    }

    Ok(credentials
        .birth_date
        .map(|date| birth_date_password(date) == password)
        .unwrap_or(false))
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
