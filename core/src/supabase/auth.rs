//! Accounts through the GoTrue auth API

use super::{failure_message, SupabaseClient};
use crate::auth::{AuthOutcome, AuthProvider, AuthProviderError, AuthSession, AuthUser};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// GoTrue answers sign-up with a session when confirmation is off, otherwise with the bare user.
fn outcome_from_body(body: Value) -> Result<AuthOutcome, AuthProviderError> {
    let decode = |e: serde_json::Error| AuthProviderError::Transport(format!("unexpected auth response: {}", e));

    if body.get("access_token").is_some() {
        let user = match body.get("user") {
            Some(user) if !user.is_null() => Some(serde_json::from_value::<AuthUser>(user.clone()).map_err(decode)?),
            _ => None,
        };
        let session = serde_json::from_value::<AuthSession>(body).map_err(decode)?;
        return Ok(AuthOutcome {
            user,
            session: Some(session),
        });
    }

    if body.get("id").is_some() {
        let user = serde_json::from_value::<AuthUser>(body).map_err(decode)?;
        return Ok(AuthOutcome {
            user: Some(user),
            session: None,
        });
    }

    Ok(AuthOutcome::default())
}

impl SupabaseClient {
    async fn password_request(&self, url: String, email: &str, password: &str) -> Result<AuthOutcome, AuthProviderError> {
        let response = self
            .keyed(self.http.post(url), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthProviderError::Rejected(failure_message(response).await));
        }
        outcome_from_body(response.json().await?)
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthProviderError> {
        self.password_request(self.auth_url("signup"), email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthProviderError> {
        self.password_request(self.auth_url("token?grant_type=password"), email, password)
            .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let response = self
            .keyed(self.http.post(self.auth_url("logout")), Some(access_token))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthProviderError::Rejected(failure_message(response).await));
        }
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthProviderError> {
        let response = self
            .keyed(self.http.get(self.auth_url("user")), Some(access_token))
            .send()
            .await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(AuthProviderError::Rejected(failure_message(response).await)),
        }
    }

    async fn delete_profile(&self, access_token: &str, user_id: &str) -> Result<(), AuthProviderError> {
        let response = self
            .keyed(self.http.delete(self.rest_url("user_profiles")), Some(access_token))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthProviderError::Rejected(failure_message(response).await));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AuthProviderError> {
        let service_key = self.service_role_key.as_deref().ok_or_else(|| {
            AuthProviderError::NotConfigured(
                "Account deletion requires SUPABASE_SERVICE_ROLE_KEY".to_string(),
            )
        })?;

        let response = self
            .http
            .delete(self.auth_url(&format!("admin/users/{}", user_id)))
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthProviderError::Rejected(failure_message(response).await));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::SupabaseConfig;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, service_role_key: Option<&str>) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: server.uri(),
            anon_key: "anon-key".into(),
            service_role_key: service_role_key.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn test_signup_without_confirmation_has_no_session() {
        let outcome = outcome_from_body(json!({ "id": "u1", "email": "a@b.co", "confirmation_sent_at": "now" })).unwrap();
        assert_eq!(outcome.user.unwrap().id, "u1");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_returns_session_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({ "email": "a@b.co", "password": "Str0ng!pass" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-123",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh-1",
                "user": { "id": "u1", "email": "a@b.co", "role": "authenticated" }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server, None).sign_in("a@b.co", "Str0ng!pass").await.unwrap();
        assert_eq!(outcome.session.unwrap().access_token, "jwt-123");
        assert_eq!(outcome.user.unwrap().email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn test_rejected_credentials_keep_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = client(&server, None).sign_in("a@b.co", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_current_user_with_expired_token_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer expired"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })))
            .mount(&server)
            .await;

        assert!(client(&server, None).current_user("expired").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_uses_service_role_key() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/u1"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, Some("service-key")).delete_user("u1").await.unwrap();

        let err = client(&server, None).delete_user("u1").await.unwrap_err();
        assert!(matches!(err, AuthProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_delete_profile_filters_by_user() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("user_id", "eq.u1"))
            .and(header("authorization", "Bearer jwt-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, None).delete_profile("jwt-123", "u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_account_deletion_survives_rejected_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u1", "email": "a@b.co" })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "msg": "User from sub claim in JWT does not exist"
            })))
            .mount(&server)
            .await;

        let service = crate::auth::AuthService::new(std::sync::Arc::new(client(&server, Some("service-key"))));
        service.delete_account("jwt-123").await.unwrap();
    }
}
