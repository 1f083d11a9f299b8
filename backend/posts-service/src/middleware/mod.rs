/// HTTP middleware for posts-service
///
/// `ViewerIdentity` reads an optional `Authorization: Bearer` token and stores
/// the resulting `Viewer` in request extensions. A missing or invalid token
/// leaves the request anonymous; handlers that need a viewer extract `Viewer`
/// and guests are redirected to the login page.
use crate::error::{AppError, Result as AppResult};
use crate::models::User;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Where guests are sent when a page needs a viewer
pub const LOGIN_PATH: &str = "/auth/login/";

/// Login URL carrying the page to return to. Slashes stay readable.
pub fn login_url(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", LOGIN_PATH, encoded)
}

// =====================================================================
// Tokens
// =====================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing material shared by the middleware and token issuers
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token identifying `user`, valid for `ttl`.
    pub fn issue_token(&self, user: &User, ttl: Duration) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> AppResult<Viewer> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AppError::Forbidden(format!("invalid token: {}", e)))?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Forbidden("invalid subject".into()))?;
        Ok(Viewer {
            id,
            username: data.claims.username,
        })
    }
}

// =====================================================================
// Viewer identity
// =====================================================================

/// The authenticated user making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
    pub username: String,
}

/// Viewer if one is signed in, for pages that also serve guests
#[derive(Debug, Clone)]
pub struct OptionalViewer(pub Option<Viewer>);

pub struct ViewerIdentity {
    keys: Arc<JwtKeys>,
}

impl ViewerIdentity {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ViewerIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ViewerIdentityService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ViewerIdentityService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct ViewerIdentityService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for ViewerIdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        if let Some(token) = token {
            match self.keys.validate(token) {
                Ok(viewer) => {
                    req.extensions_mut().insert(viewer);
                }
                Err(err) => {
                    tracing::warn!(path = %req.path(), "ignoring bearer token: {}", err);
                }
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

fn next_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Viewer>()
                .cloned()
                .ok_or_else(|| AppError::LoginRequired {
                    next: next_path(req),
                }),
        )
    }
}

impl FromRequest for OptionalViewer {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(OptionalViewer(req.extensions().get::<Viewer>().cloned())))
    }
}
