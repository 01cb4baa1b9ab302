//! Authentication middleware and extractors.
//!
//! `auth_gate` runs on every request and keeps anonymous visitors on the
//! public pages. The extractors give handlers the signed-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use px_shop_core::access::{self, GateDecision, SessionState};

use crate::models::{CurrentUser, session_keys};

/// Header set by HTMX on its requests.
const HX_REQUEST: &str = "hx-request";

/// Header telling HTMX to navigate the whole page.
const HX_REDIRECT: &str = "hx-redirect";

/// Placeholder shown while the session cannot be resolved. The browser
/// retries after a second.
#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
pub struct LoadingTemplate;

/// Extractor that requires a signed-in user.
///
/// If the visitor is not signed in, redirects to the login page with a
/// `redirect` back to the current path.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.greeting_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the visitor is not signed in.
pub enum AuthRejection {
    /// Redirect to the login page, then back to this path.
    RedirectToLogin(String),
    /// Unauthorized response (for HTMX requests).
    Unauthorized(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => {
                Redirect::to(&access::login_redirect(&path)).into_response()
            }
            Self::Unauthorized(path) => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(value) = HeaderValue::from_str(&access::login_redirect(&path)) {
                    response.headers_mut().insert(HX_REDIRECT, value);
                }
                response
            }
        }
    }
}

impl AuthRejection {
    fn for_request(headers: &HeaderMap, path: String) -> Self {
        if is_htmx(headers) {
            Self::Unauthorized(path)
        } else {
            Self::RedirectToLogin(path)
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_owned();

        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(AuthRejection::for_request(&parts.headers, path));
        };

        match session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
        {
            Some(user) => Ok(Self(user)),
            None => Err(AuthRejection::for_request(&parts.headers, path)),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Work out what is known about the visitor.
///
/// A missing session layer or a store failure leaves the state `Resolving`.
pub async fn resolve_session_state(session: Option<&Session>) -> SessionState {
    let Some(session) = session else {
        return SessionState::Resolving;
    };

    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(Some(_)) => SessionState::Authenticated,
        Ok(None) => SessionState::Anonymous,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to resolve session");
            SessionState::Resolving
        }
    }
}

/// Gate every request on the public-path allow-list.
///
/// - Pending: 503 loading page with `Refresh: 1`
/// - Redirect: 303 to `/auth/login?redirect=<path>` (HTMX gets 401 + `HX-Redirect`)
/// - Asset and health paths skip the gate.
pub async fn auth_gate(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if access::bypasses_gate(path) {
        return next.run(request).await;
    }

    let state = resolve_session_state(request.extensions().get::<Session>()).await;

    match access::decide(state, path) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Pending => (
            StatusCode::SERVICE_UNAVAILABLE,
            [("refresh", "1")],
            LoadingTemplate,
        )
            .into_response(),
        GateDecision::RedirectToLogin => {
            let target = request
                .uri()
                .path_and_query()
                .map_or_else(|| path.to_owned(), |pq| pq.as_str().to_owned());
            tracing::debug!(path = %target, "Redirecting anonymous visitor to login");
            AuthRejection::for_request(request.headers(), target).into_response()
        }
    }
}

/// Whether the request was issued by HTMX.
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"true"))
}
