use reqwest::Method;
use serde_json::Value;

use casedesk_auth::{
    AttorneyRegistration, AuthGrant, ClientRegistration, LoginRequest, PasswordChange,
    ProfileUpdate, User,
};

use super::{envelope, ApiClient, ApiError, ApiResponse};

const USER_KEYS: &[&str] = &["user"];

/// `/auth/*` endpoints. Nothing here touches storage; the session store does.
pub struct AuthApi<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<ApiResponse<AuthGrant>, ApiError> {
        const CONTEXT: &str = "Login failed";
        let req = self
            .api
            .request(Method::POST, CONTEXT, &["auth", "login"])?
            .json(credentials);
        grant(CONTEXT, self.api.send(CONTEXT, req).await?)
    }

    /// Attorney signup; the API creates the firm alongside the account.
    pub async fn register_attorney(
        &self,
        form: &AttorneyRegistration,
    ) -> Result<ApiResponse<AuthGrant>, ApiError> {
        const CONTEXT: &str = "Registration failed";
        let req = self
            .api
            .request(Method::POST, CONTEXT, &["auth", "register"])?
            .json(form);
        grant(CONTEXT, self.api.send(CONTEXT, req).await?)
    }

    pub async fn register_client(
        &self,
        form: &ClientRegistration,
    ) -> Result<ApiResponse<AuthGrant>, ApiError> {
        const CONTEXT: &str = "Client registration failed";
        let req = self
            .api
            .request(Method::POST, CONTEXT, &["auth", "register-client"])?
            .json(form);
        grant(CONTEXT, self.api.send(CONTEXT, req).await?)
    }

    pub async fn profile(&self) -> Result<ApiResponse<User>, ApiError> {
        const CONTEXT: &str = "Failed to fetch profile";
        let req = self.api.request(Method::GET, CONTEXT, &["auth", "profile"])?;
        self.api.send_record(CONTEXT, req, USER_KEYS).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ApiResponse<User>, ApiError> {
        const CONTEXT: &str = "Failed to update profile";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["auth", "profile"])?
            .json(update);
        self.api.send_record(CONTEXT, req, USER_KEYS).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<ApiResponse<Value>, ApiError> {
        const CONTEXT: &str = "Failed to change password";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["auth", "change-password"])?
            .json(change);
        self.api.send(CONTEXT, req).await
    }
}

/// `{token, user}`, optionally wrapped in `data`; a body with no `user`
/// member is taken to be the user itself.
fn parse_grant(body: Value) -> Result<AuthGrant, serde_json::Error> {
    let mut body = envelope::extract_record(body, &[]);
    envelope::canonicalize_keys(&mut body);
    let mut record = match body {
        Value::Object(map) => map,
        other => return Err(serde::de::Error::custom(format!("expected an object, got {other}"))),
    };

    let token = match record.remove("token") {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    };
    let user = match record.remove("user") {
        Some(user) => serde_json::from_value(user)?,
        None => serde_json::from_value(Value::Object(record))?,
    };

    Ok(AuthGrant { token, user })
}

fn grant(context: &'static str, res: ApiResponse<Value>) -> Result<ApiResponse<AuthGrant>, ApiError> {
    res.try_map(|body| {
        parse_grant(body).map_err(|e| ApiError::Decode {
            context,
            message: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn grant_shapes() {
        let flat = parse_grant(json!({"token": "t1", "user": {"email": "a@b.c", "role": "attorney"}})).unwrap();
        assert_eq!(flat.token.as_deref(), Some("t1"));
        assert_eq!(flat.user.email, "a@b.c");

        let wrapped = parse_grant(json!({
            "success": true,
            "data": {"token": "t2", "user": {"email": "c@d.e", "role": "client"}}
        }))
        .unwrap();
        assert_eq!(wrapped.token.as_deref(), Some("t2"));
        assert!(wrapped.user.capabilities().is_client);

        let bare_user = parse_grant(json!({"email": "e@f.g", "role": "paralegal"})).unwrap();
        assert_eq!(bare_user.token, None);
        assert!(bare_user.user.capabilities().is_paralegal);
    }

    #[test]
    fn grant_user_may_carry_both_id_spellings() {
        let grant = parse_grant(json!({
            "token": "t3",
            "user": {"_id": "u7", "id": "u7", "email": "g@h.i", "role": "attorney"}
        }))
        .unwrap();
        assert_eq!(grant.user.id.as_ref().map(|id| id.as_str()), Some("u7"));
        assert!(!grant.user.extra.contains_key("_id"));
    }

    #[test]
    fn grant_without_role_is_rejected() {
        assert!(parse_grant(json!({"token": "t", "user": {"email": "x"}})).is_err());
        assert!(parse_grant(json!("nope")).is_err());
    }
}
