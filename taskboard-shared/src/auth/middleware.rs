/// Identity middleware for Axum
///
/// Resolves the `Authorization: Bearer <token>` header into an
/// [`AuthContext`] and adds it to the request extensions. Requests without a
/// usable token are not rejected here: they carry an anonymous context and
/// each operation decides whether it needs a user.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskboard_shared::auth::middleware::{create_identity_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     match auth.user_id {
///         Some(id) => format!("user {}", id),
///         None => "anonymous".to_string(),
///     }
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_identity_middleware("secret".to_string())));
/// ```

use std::{future::Future, pin::Pin, sync::Arc};

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::jwt::validate_token;

/// Identity of the caller, added to every request's extensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user, `None` for anonymous callers
    pub user_id: Option<Uuid>,
}

impl AuthContext {
    /// Context for a request without a valid credential
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// Context for a request carrying a valid token for `user_id`
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Resolves an `Authorization` header value to a user id
///
/// A missing header, a scheme other than `Bearer`, a bad signature, an
/// expired token or a malformed token all resolve to `None`.
pub fn verify_bearer(header: Option<&str>, secret: &str) -> Option<Uuid> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    match validate_token(token, secret) {
        Ok(claims) => Some(claims.sub),
        Err(e) => {
            debug!(error = %e, "Ignoring unusable bearer token");
            None
        }
    }
}

/// Identity middleware
///
/// Never fails; always inserts an [`AuthContext`].
pub async fn identity_middleware(secret: Arc<str>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let context = match verify_bearer(header, &secret) {
        Some(user_id) => AuthContext::from_jwt(user_id),
        None => AuthContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Creates an identity middleware closure that captures the JWT secret
///
/// Use with `axum::middleware::from_fn`.
pub fn create_identity_middleware(
    secret: String,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    let secret: Arc<str> = Arc::from(secret);
    move |req, next| Box::pin(identity_middleware(secret.clone(), req, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Extension, Router};
    use chrono::Duration;
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret-at-least-32-bytes";

    fn token_for(user_id: Uuid) -> String {
        create_token(&Claims::new(user_id), SECRET).unwrap()
    }

    #[test]
    fn test_auth_context_constructors() {
        let user_id = Uuid::new_v4();

        assert!(!AuthContext::anonymous().is_authenticated());
        assert_eq!(AuthContext::default(), AuthContext::anonymous());

        let context = AuthContext::from_jwt(user_id);
        assert!(context.is_authenticated());
        assert_eq!(context.user_id, Some(user_id));
    }

    #[test]
    fn test_verify_bearer_valid() {
        let user_id = Uuid::new_v4();
        let header = format!("Bearer {}", token_for(user_id));

        assert_eq!(verify_bearer(Some(&header), SECRET), Some(user_id));
    }

    #[test]
    fn test_verify_bearer_rejections_are_anonymous() {
        let token = token_for(Uuid::new_v4());
        let expired = create_token(
            &Claims::with_expiration(Uuid::new_v4(), Duration::seconds(-60)),
            SECRET,
        )
        .unwrap();

        assert_eq!(verify_bearer(None, SECRET), None);
        assert_eq!(verify_bearer(Some(""), SECRET), None);
        assert_eq!(verify_bearer(Some("Bearer "), SECRET), None);
        assert_eq!(verify_bearer(Some(&format!("Basic {}", token)), SECRET), None);
        assert_eq!(verify_bearer(Some(&token), SECRET), None);
        assert_eq!(verify_bearer(Some("Bearer garbage"), SECRET), None);
        assert_eq!(
            verify_bearer(Some(&format!("Bearer {}", token)), "wrong-secret-wrong-secret-wrong"),
            None
        );
        assert_eq!(verify_bearer(Some(&format!("Bearer {}", expired)), SECRET), None);
    }

    async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
        auth.user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(create_identity_middleware(SECRET.to_string())))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_middleware_inserts_user() {
        let user_id = Uuid::new_v4();
        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)))
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, user_id.to_string());
    }

    #[tokio::test]
    async fn test_middleware_passes_anonymous_requests() {
        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }
}
