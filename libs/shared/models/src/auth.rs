use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Application role. Supabase keeps the app-level role in `app_metadata`
    /// and uses the top-level `role` claim for the database role.
    pub fn app_role(&self) -> Option<String> {
        self.app_metadata
            .as_ref()
            .and_then(|meta| meta.get("role"))
            .and_then(|role| role.as_str())
            .map(str::to_string)
            .or_else(|| self.role.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(role: Option<&str>, app_metadata: Option<serde_json::Value>) -> JwtClaims {
        JwtClaims {
            sub: "user-1".to_string(),
            exp: None,
            email: None,
            role: role.map(str::to_string),
            app_metadata,
            user_metadata: None,
            aud: None,
            iat: None,
        }
    }

    #[test]
    fn test_app_role_prefers_app_metadata() {
        let c = claims(Some("authenticated"), Some(json!({ "role": "admin" })));
        assert_eq!(c.app_role().as_deref(), Some("admin"));
    }

    #[test]
    fn test_app_role_falls_back_to_role_claim() {
        let c = claims(Some("admin"), None);
        assert_eq!(c.app_role().as_deref(), Some("admin"));
        assert_eq!(claims(None, Some(json!({}))).app_role(), None);
    }
}
