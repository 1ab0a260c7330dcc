use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::config::Config;

pub mod api;

/// Represents the currently authenticated user, as vouched for by the
/// identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: String, email: String) -> Self {
        Self { id, email }
    }
}

/// Who is driving the current request. Task operations are only attempted
/// for [`Identity::Authenticated`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(CurrentUser),
}

impl Identity {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }
}

impl From<Option<CurrentUser>> for Identity {
    fn from(user: Option<CurrentUser>) -> Self {
        user.map_or(Identity::Anonymous, Identity::Authenticated)
    }
}

/// Authentication state containing the session verification secret.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub session_cookie: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }

    /// Returns the user a session token belongs to, if the token is valid.
    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        match decode_jwt(token, &self.jwt_secret) {
            Ok(claims) => Some(CurrentUser::new(claims.sub, claims.email)),
            Err(err) => {
                tracing::debug!("Rejected session token: {}", err);
                None
            }
        }
    }
}

/// Session token claims issued by the identity provider.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub sub: String, // Stable user ID
    #[serde(default)]
    pub email: String,
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Represents an error during JWT operations.
    #[error("JWT operation failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Authentication middleware that checks the session cookie and sets the
/// CurrentUser extension. It never redirects.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token_cookie) = jar.get(&state.session_cookie) {
        if let Some(current_user) = state.verify(token_cookie.value()) {
            request.extensions_mut().insert(current_user);
        }
    }

    next.run(request).await
}

/// Sends visitors without a CurrentUser extension back to the landing page.
/// Apply after auth_user_middleware.
pub async fn landing_redirect_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        return axum::response::Redirect::to("/").into_response();
    }

    next.run(request).await
}

/// Signs a 24 hour session token for the user.
pub fn encode_jwt(user: &CurrentUser, jwt_secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        exp: (now + expire).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    let jwt = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token_data = jsonwebtoken::decode(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(token_data.claims)
}
