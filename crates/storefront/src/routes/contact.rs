//! Contact form route handlers.
//!
//! Submissions are validated, held for a simulated send delay and logged.
//! Nothing is delivered anywhere.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::{Email, ValidationErrors};

use crate::error::{AppError, add_breadcrumb};
use crate::routes::PageContext;
use crate::services::ProcessingTask;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// Every field is required and the email must parse.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required");
        errors.require("email", &self.email, "Email is required");
        errors.require("subject", &self.subject, "Subject is required");
        errors.require("message", &self.message, "Message is required");

        if !errors.contains("email") && Email::parse(self.email.trim()).is_err() {
            errors.insert("email", "Please enter a valid email address");
        }
        errors
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
    pub form: ContactForm,
    pub errors: ValidationErrors,
    pub sent: bool,
}

/// Display the contact form.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<impl IntoResponse, AppError> {
    Ok(ContactTemplate {
        page: PageContext::load(&session).await?,
        form: ContactForm::default(),
        errors: ValidationErrors::new(),
        sent: false,
    })
}

/// Handle a contact form submission.
///
/// Invalid input re-renders the form with HTTP 422. A valid message waits
/// out the configured send delay, then shows the confirmation.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let page = PageContext::load(&session).await?;
    let errors = form.validate();

    if !errors.is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ContactTemplate {
                page,
                form,
                errors,
                sent: false,
            },
        )
            .into_response());
    }

    add_breadcrumb("contact", "Sending message", None);
    ProcessingTask::start(state.config().contact_delay)
        .wait()
        .await?;

    tracing::info!(subject = %form.subject.trim(), "Contact message received");

    Ok(ContactTemplate {
        page,
        form: ContactForm::default(),
        errors: ValidationErrors::new(),
        sent: true,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ContactForm {
        ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Order question".to_string(),
            message: "Where is my parcel?".to_string(),
        }
    }

    #[test]
    fn test_complete_form_is_valid() {
        assert!(filled().validate().is_empty());
    }

    #[test]
    fn test_blank_form_reports_every_field() {
        let errors = ContactForm::default().validate();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let form = ContactForm {
            subject: "   ".to_string(),
            ..filled()
        };
        assert_eq!(form.validate().get("subject"), Some("Subject is required"));
    }

    #[test]
    fn test_malformed_email() {
        let form = ContactForm {
            email: "not-an-email".to_string(),
            ..filled()
        };
        assert_eq!(
            form.validate().get("email"),
            Some("Please enter a valid email address")
        );
    }
}
