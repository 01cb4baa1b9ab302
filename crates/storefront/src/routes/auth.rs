//! Authentication route handlers.
//!
//! Email + password sign-in and registration against the local user table.
//! Both forms carry a `redirect` target so the visitor lands back where the
//! auth gate stopped them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::access::safe_redirect_target;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, User};
use crate::routes::PageContext;
use crate::services::auth::{self, AuthError, AuthService};
use crate::state::AppState;

/// Shown when a required field is blank.
const MISSING_FIELDS: &str = "Please fill in all fields";

/// Shown for any sign-in failure; never reveals which part was wrong.
const SIGN_IN_FAILED: &str = "Failed to sign in. Please check your credentials.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub display_name: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub redirect: Option<String>,
}

/// Query parameters carrying the post-login destination.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub redirect: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub display_name: String,
    pub redirect: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Visitors who are already signed in go straight to the redirect target.
#[instrument(skip(session, user))]
pub async fn login_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect_target(query.redirect.as_deref()).to_string();
    if user.is_some() {
        return Ok(Redirect::to(&redirect).into_response());
    }

    Ok(LoginTemplate {
        page: PageContext::load(&session).await?,
        error: None,
        email: String::new(),
        redirect,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect_target(form.redirect.as_deref()).to_string();

    let rerender = |error: &str, status: StatusCode, page: PageContext| {
        (
            status,
            LoginTemplate {
                page,
                error: Some(error.to_string()),
                email: form.email.clone(),
                redirect: redirect.clone(),
            },
        )
            .into_response()
    };

    if form.email.trim().is_empty() || form.password.is_empty() {
        let page = PageContext::load(&session).await?;
        return Ok(rerender(MISSING_FIELDS, StatusCode::UNPROCESSABLE_ENTITY, page));
    }

    match AuthService::new(state.pool())
        .sign_in(form.email.trim(), &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User signed in");
            Ok(Redirect::to(&redirect).into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::warn!("Sign-in failed");
            let page = PageContext::load(&session).await?;
            Ok(rerender(SIGN_IN_FAILED, StatusCode::UNAUTHORIZED, page))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(session, user))]
pub async fn register_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect_target(query.redirect.as_deref()).to_string();
    if user.is_some() {
        return Ok(Redirect::to(&redirect).into_response());
    }

    Ok(RegisterTemplate {
        page: PageContext::load(&session).await?,
        error: None,
        email: String::new(),
        display_name: String::new(),
        redirect,
    }
    .into_response())
}

/// Handle registration form submission.
///
/// A new account is signed in immediately.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect_target(form.redirect.as_deref()).to_string();

    let error = if form.email.trim().is_empty() || form.password.is_empty() {
        Some(MISSING_FIELDS.to_string())
    } else if form.password != form.password_confirm {
        Some("Passwords do not match".to_string())
    } else {
        match AuthService::new(state.pool())
            .register(
                form.email.trim(),
                &form.password,
                form.display_name.as_deref(),
            )
            .await
        {
            Ok(user) => {
                start_session(&session, &user).await?;
                tracing::info!(user_id = %user.id, "User registered");
                return Ok(Redirect::to(&redirect).into_response());
            }
            Err(AuthError::UserAlreadyExists) => {
                Some("An account with this email already exists".to_string())
            }
            Err(AuthError::WeakPassword(message)) => Some(message),
            Err(AuthError::InvalidEmail(_)) => {
                Some("Please enter a valid email address".to_string())
            }
            Err(e) => return Err(e.into()),
        }
    };

    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        RegisterTemplate {
            page: PageContext::load(&session).await?,
            error,
            email: form.email,
            display_name: form.display_name.unwrap_or_default(),
            redirect,
        },
    )
        .into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. The cart and wishlist stay with the visitor.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    auth::sign_out(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    auth::set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
