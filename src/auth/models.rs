use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account kinds; users upload videos, admins read the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user or admin id)
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,    // JWT ID
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admins may sign in with either their username or their email
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub admin_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub admin: AdminInfo,
}

/// Authenticated caller, inserted into request extensions by the JWT middleware
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, std::num::ParseIntError> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            email: claims.email.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Users may read their own data; admins may read anyone's
    pub fn can_access_user(&self, user_id: i64) -> bool {
        self.is_admin() || (self.role == UserRole::User && self.user_id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: i64, role: UserRole) -> UserSession {
        UserSession {
            user_id,
            email: "someone@example.com".to_string(),
            role,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_user_access_rules() {
        let user = session(7, UserRole::User);
        assert!(user.can_access_user(7));
        assert!(!user.can_access_user(8));
        assert!(!user.is_admin());

        // Admin ids live in a separate table; admin 7 is not user 7
        let admin = session(1, UserRole::Admin);
        assert!(admin.can_access_user(7));
        assert!(admin.can_access_user(1));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"user\"").unwrap(),
            UserRole::User
        );
    }
}
