/// Registration and login handlers
use actix_web::{web, HttpResponse};

use crate::error::{AppError, Result};
use crate::models::{LoginRequest, SignupRequest, UserRecord};
use crate::security::{jwt::TokenIssuer, password};
use crate::services::user_store::UserStore;

/// Register a new user. The username is unique across the credential
/// store; a duplicate registration fails with 409.
pub async fn signup(
    store: web::Data<UserStore>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    if !valid_username(&payload.username) || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "wrong username or password format".to_string(),
        ));
    }

    let record = UserRecord {
        username: payload.username.clone(),
        password_hash: password::hash_password(&payload.password)?,
        age: payload.age,
        gender: payload.gender.clone(),
    };

    store.register(&record).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("Successfully registered user: {}", payload.username)))
}

/// Verify credentials and issue a bearer token.
pub async fn login(
    store: web::Data<UserStore>,
    issuer: web::Data<TokenIssuer>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    store.verify(&payload.username, &payload.password).await?;

    let token = issuer.issue(&payload.username)?;

    Ok(HttpResponse::Ok().content_type("text/plain").body(token))
}

/// Usernames are non-empty `[A-Za-z0-9_]+`.
fn valid_username(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(valid_username("alice"));
        assert!(valid_username("alice_42"));
        assert!(!valid_username(""));
        assert!(!valid_username("alice smith"));
        assert!(!valid_username("alice!"));
        assert!(!valid_username("ålice"));
    }
}
