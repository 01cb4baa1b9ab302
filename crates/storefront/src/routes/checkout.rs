//! Checkout route handlers.
//!
//! The flow is Shipping → Payment → Review → Complete and lives in the
//! session next to the cart. Each form step re-renders with per-field
//! messages (HTTP 422) until it validates, then redirects back to
//! `GET /checkout` for the next step.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::{
    CartStore, CheckoutError, CheckoutFlow, CheckoutStep, OrderConfirmation, PaymentInfo,
    ShippingInfo, ValidationErrors,
};

use crate::error::AppError;
use crate::middleware::OptionalAuth;
use crate::routes::cart::{CartLineView, CartView};
use crate::routes::{PageContext, money};
use crate::services::{checkout as checkout_service, stores};
use crate::state::AppState;

/// Progress indicator entry.
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    pub active: bool,
    pub done: bool,
}

/// A labelled form input with its current value and error.
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub placeholder: &'static str,
    pub value: String,
    pub error: Option<&'static str>,
}

impl FieldView {
    fn new(
        name: &'static str,
        label: &'static str,
        input_type: &'static str,
        placeholder: &'static str,
        value: &str,
        errors: &ValidationErrors,
    ) -> Self {
        Self {
            name,
            label,
            input_type,
            placeholder,
            value: value.to_string(),
            error: errors.get(name),
        }
    }
}

fn shipping_fields(info: &ShippingInfo, errors: &ValidationErrors) -> Vec<FieldView> {
    vec![
        FieldView::new("first_name", "First Name", "text", "", &info.first_name, errors),
        FieldView::new("last_name", "Last Name", "text", "", &info.last_name, errors),
        FieldView::new("email", "Email", "email", "you@example.com", &info.email, errors),
        FieldView::new("phone", "Phone", "tel", "", &info.phone, errors),
        FieldView::new("address", "Address", "text", "", &info.address, errors),
        FieldView::new("city", "City", "text", "", &info.city, errors),
        FieldView::new("state", "State", "text", "", &info.state, errors),
        FieldView::new("zip_code", "ZIP Code", "text", "", &info.zip_code, errors),
        FieldView::new("country", "Country", "text", "", &info.country, errors),
    ]
}

fn payment_fields(info: &PaymentInfo, errors: &ValidationErrors) -> Vec<FieldView> {
    vec![
        FieldView::new(
            "card_number",
            "Card Number",
            "text",
            "1234 5678 9012 3456",
            &info.card_number,
            errors,
        ),
        FieldView::new("expiry_date", "Expiry Date", "text", "MM/YY", &info.expiry_date, errors),
        FieldView::new("cvv", "CVV", "text", "123", &info.cvv, errors),
        FieldView::new(
            "cardholder_name",
            "Cardholder Name",
            "text",
            "",
            &info.cardholder_name,
            errors,
        ),
    ]
}

/// Checkout page template (Shipping, Payment and Review steps).
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub step: u8,
    pub steps: Vec<StepView>,
    pub fields: Vec<FieldView>,
    pub shipping: ShippingInfo,
    pub masked_card: String,
    pub expiry_date: String,
    pub cardholder_name: String,
    pub cart: CartView,
}

impl CheckoutTemplate {
    fn new(
        page: PageContext,
        flow: &CheckoutFlow,
        cart: &CartStore,
        errors: &ValidationErrors,
    ) -> Self {
        let step = flow.step();
        let fields = match step {
            CheckoutStep::Shipping => shipping_fields(flow.shipping(), errors),
            CheckoutStep::Payment => payment_fields(flow.payment(), errors),
            CheckoutStep::Review | CheckoutStep::Complete => Vec::new(),
        };

        Self {
            page,
            step: step.number(),
            steps: CheckoutStep::PROGRESS
                .iter()
                .map(|s| StepView {
                    number: s.number(),
                    title: s.title(),
                    active: *s == step,
                    done: s.number() < step.number(),
                })
                .collect(),
            fields,
            shipping: flow.shipping().clone(),
            masked_card: flow.payment().masked_card_number(),
            expiry_date: flow.payment().expiry_date.clone(),
            cardholder_name: flow.payment().cardholder_name.clone(),
            cart: CartView::from(cart),
        }
    }
}

/// Order confirmation display data.
pub struct ConfirmationView {
    pub reference: String,
    pub email: String,
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub placed_at: String,
}

impl From<&OrderConfirmation> for ConfirmationView {
    fn from(confirmation: &OrderConfirmation) -> Self {
        Self {
            reference: confirmation.reference.clone(),
            email: confirmation.email.clone(),
            items: confirmation.items.iter().map(CartLineView::from).collect(),
            subtotal: money(confirmation.subtotal),
            tax: money(confirmation.tax),
            total: money(confirmation.total),
            placed_at: confirmation.placed_at.format("%B %-d, %Y %H:%M UTC").to_string(),
        }
    }
}

/// Order complete page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CompleteTemplate {
    pub page: PageContext,
    pub confirmation: ConfirmationView,
}

/// Render the current step, with `status` (422 when re-showing a form).
async fn render_step(
    session: &Session,
    flow: &CheckoutFlow,
    cart: &CartStore,
    errors: &ValidationErrors,
    status: StatusCode,
) -> Result<Response, AppError> {
    let page = PageContext::load(session).await?;
    Ok((status, CheckoutTemplate::new(page, flow, cart, errors)).into_response())
}

/// Show the current checkout step.
///
/// Starts a flow (email pre-filled for the signed-in user) when none is in
/// progress. An empty cart goes back to `/cart`, unless an order was just
/// placed, in which case the confirmation is shown.
#[instrument(skip(session, user))]
pub async fn show(
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    let cart = stores::load_cart(&session).await?;
    let flow = match stores::load_checkout(&session).await? {
        Some(flow) if flow.step() == CheckoutStep::Complete => {
            if cart.is_empty() {
                return Ok(Redirect::to("/checkout/complete").into_response());
            }
            None
        }
        other => other,
    };

    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let flow = match flow {
        Some(flow) => flow,
        None => {
            let flow = user
                .as_ref()
                .map_or_else(CheckoutFlow::new, |u| CheckoutFlow::with_email(u.email.as_str()));
            stores::save_checkout(&session, &flow).await?;
            flow
        }
    };

    render_step(&session, &flow, &cart, &ValidationErrors::new(), StatusCode::OK).await
}

/// Outcome of a form step shared by shipping and payment.
async fn after_submit(
    session: &Session,
    flow: &CheckoutFlow,
    result: Result<(), CheckoutError>,
) -> Result<Response, AppError> {
    match result {
        Ok(()) => {
            stores::save_checkout(session, flow).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(CheckoutError::Invalid(errors)) => {
            stores::save_checkout(session, flow).await?;
            let cart = stores::load_cart(session).await?;
            render_step(session, flow, &cart, &errors, StatusCode::UNPROCESSABLE_ENTITY).await
        }
        // A stale form (back button, double submit): show whatever step is current.
        Err(CheckoutError::WrongStep { .. }) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Submit the shipping step.
#[instrument(skip(session, info))]
pub async fn submit_shipping(
    session: Session,
    Form(info): Form<ShippingInfo>,
) -> Result<Response, AppError> {
    let mut flow = stores::load_checkout(&session)
        .await?
        .unwrap_or_else(CheckoutFlow::new);
    let result = flow.submit_shipping(info);
    after_submit(&session, &flow, result).await
}

/// Submit the payment step.
#[instrument(skip(session, info))]
pub async fn submit_payment(
    session: Session,
    Form(info): Form<PaymentInfo>,
) -> Result<Response, AppError> {
    let mut flow = stores::load_checkout(&session)
        .await?
        .unwrap_or_else(CheckoutFlow::new);
    let result = flow.submit_payment(info);
    after_submit(&session, &flow, result).await
}

/// Go back one step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Redirect, AppError> {
    if let Some(mut flow) = stores::load_checkout(&session).await? {
        flow.back(Utc::now())?;
        stores::save_checkout(&session, &flow).await?;
    }
    Ok(Redirect::to("/checkout"))
}

/// Place the order after the simulated processing delay.
#[instrument(skip(state, session))]
pub async fn place(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    match checkout_service::place_order(&session, state.config().checkout_delay).await {
        Ok(_) => Ok(Redirect::to("/checkout/complete")),
        Err(AppError::Checkout(CheckoutError::EmptyCart)) => Ok(Redirect::to("/cart")),
        Err(AppError::Checkout(CheckoutError::WrongStep { .. })) => Ok(Redirect::to("/checkout")),
        Err(e) => Err(e),
    }
}

/// Show the confirmation for the order just placed.
#[instrument(skip(session))]
pub async fn complete(session: Session) -> Result<Response, AppError> {
    let flow = stores::load_checkout(&session).await?;
    let Some(confirmation) = flow.as_ref().and_then(CheckoutFlow::confirmation) else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let page = PageContext::load(&session).await?;
    Ok(CompleteTemplate {
        page,
        confirmation: ConfirmationView::from(confirmation),
    }
    .into_response())
}
