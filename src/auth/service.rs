use regex::Regex;
use sqlx::PgPool;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{
    AdminAuthResponse, AdminInfo, AdminLoginRequest, AuthError, AuthResponse, JwtService,
    LoginRequest, RegisterRequest, RegisterResponse, UserInfo, UserRole, UserSession,
};
use crate::models::{Admin, User};
use crate::services::UserService;

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    users: UserService,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            users: UserService::new(db),
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AuthError::NameValidation("name must not be empty".to_string()));
        }
        let email = normalize_email(&request.email)?;

        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        // A concurrent registration can still win the unique index
        let user = self
            .users
            .create_user(name, &email, &password_hash)
            .await?
            .ok_or(AuthError::EmailAlreadyExists)?;

        info!("Registered user {}", user.user_id);

        Ok(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user_info(user),
        })
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();

        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            warn!("Failed login for user {}", user.user_id);
            return Err(AuthError::InvalidCredentials);
        }

        self.users.touch_last_active(user.user_id).await?;

        let access_token =
            self.jwt_service
                .create_access_token(user.user_id, &user.email, UserRole::User)?;

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: user_info(user),
        })
    }

    /// Login admin by username or email
    pub async fn admin_login(&self, request: AdminLoginRequest) -> Result<AdminAuthResponse, AuthError> {
        let username = non_blank(request.username.as_deref());
        let email = non_blank(request.email.as_deref()).map(str::to_lowercase);

        if username.is_none() && email.is_none() {
            return Err(AuthError::MissingLoginIdentifier);
        }

        let admin = self
            .users
            .find_admin(username, email.as_deref())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &admin.password_hash)? {
            warn!("Failed admin login for {}", admin.username);
            return Err(AuthError::InvalidCredentials);
        }

        self.users.touch_last_login(admin.admin_id).await?;

        let token_email = admin.email.clone().unwrap_or_default();
        let access_token =
            self.jwt_service
                .create_access_token(admin.admin_id, &token_email, UserRole::Admin)?;

        Ok(AdminAuthResponse {
            message: "Admin login successful".to_string(),
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            admin: admin_info(admin),
        })
    }

    /// Create or reset an admin account
    pub async fn seed_admin(&self, username: &str, email: &str, password: &str) -> Result<AdminInfo, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::NameValidation("username must not be empty".to_string()));
        }
        let email = normalize_email(email)?;
        let password_hash = hash_password(password)?;

        let admin = self.users.upsert_admin(username, &email, &password_hash).await?;
        info!("Admin account {} is ready", admin.username);

        Ok(admin_info(admin))
    }

    /// Validate user session from token
    pub fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }
}

fn admin_info(admin: Admin) -> AdminInfo {
    AdminInfo {
        admin_id: admin.admin_id,
        username: admin.username,
        email: admin.email,
        role: admin.role,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trim, lowercase and sanity-check an email address
fn normalize_email(email: &str) -> Result<String, AuthError> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    });

    let email = email.trim().to_lowercase();
    if !pattern.is_match(&email) {
        return Err(AuthError::EmailValidation(format!("'{}' is not a valid email", email)));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dancer@Example.COM ").unwrap(), "dancer@example.com");
        assert_matches!(normalize_email("not-an-email"), Err(AuthError::EmailValidation(_)));
        assert_matches!(normalize_email("a@b"), Err(AuthError::EmailValidation(_)));
        assert_matches!(normalize_email("a b@c.d"), Err(AuthError::EmailValidation(_)));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  admin ")), Some("admin"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[tokio::test]
    async fn test_admin_login_requires_identifier() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = AuthService::new(pool, "test_secret");

        let result = service
            .admin_login(AdminLoginRequest {
                username: Some(" ".to_string()),
                email: None,
                password: "whatever1".to_string(),
            })
            .await;

        assert_matches!(result, Err(AuthError::MissingLoginIdentifier));
    }
}
