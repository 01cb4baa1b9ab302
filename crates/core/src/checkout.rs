//! Checkout step machine.
//!
//! A checkout walks `Shipping → Payment → Review → Complete`. The first two
//! steps carry a typed form whose required fields must all be present before
//! the flow advances. Placing the order is split in two so the storefront can
//! run the simulated processing wait in between: [`CheckoutFlow::begin_placement`]
//! locks the flow, [`CheckoutFlow::complete`] records the confirmation.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartItem, CartStore};

/// A placement older than this is treated as abandoned and may be retried.
const PROCESSING_WINDOW_SECS: i64 = 60;

/// Default shipping country.
pub const DEFAULT_COUNTRY: &str = "United States";

/// Checkout steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
    Complete,
}

impl CheckoutStep {
    /// Steps shown in the progress indicator.
    pub const PROGRESS: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];

    /// One-based position of the step.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
            Self::Complete => 4,
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Complete => "Complete",
        }
    }
}

/// Field → message map produced by form validation. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, &'static str>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record `message` for `field` when `value` is blank.
    pub fn require(&mut self, field: &'static str, value: &str, message: &'static str) {
        if value.trim().is_empty() {
            self.0.insert(field, message);
        }
    }

    /// Record `message` for `field` unconditionally.
    pub fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }
}

/// Shipping step form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ShippingInfo {
    /// Check that every required field is filled in.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require("first_name", &self.first_name, "First name is required");
        errors.require("last_name", &self.last_name, "Last name is required");
        errors.require("email", &self.email, "Email is required");
        errors.require("phone", &self.phone, "Phone is required");
        errors.require("address", &self.address, "Address is required");
        errors.require("city", &self.city, "City is required");
        errors.require("state", &self.state, "State is required");
        errors.require("zip_code", &self.zip_code, "ZIP code is required");
        errors
    }
}

/// Payment step form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentInfo {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
}

impl PaymentInfo {
    /// Check that every required field is filled in.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require("card_number", &self.card_number, "Card number is required");
        errors.require("expiry_date", &self.expiry_date, "Expiry date is required");
        errors.require("cvv", &self.cvv, "CVV is required");
        errors.require(
            "cardholder_name",
            &self.cardholder_name,
            "Cardholder name is required",
        );
        errors
    }

    /// Copy with card number and expiry in display form.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            card_number: format_card_number(&self.card_number),
            expiry_date: format_expiry_date(&self.expiry_date),
            cvv: self.cvv.trim().to_string(),
            cardholder_name: self.cardholder_name.trim().to_string(),
        }
    }

    /// Card number with everything but the last four characters hidden.
    #[must_use]
    pub fn masked_card_number(&self) -> String {
        let compact: Vec<char> = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let last_four: String = compact.iter().skip(compact.len().saturating_sub(4)).collect();
        format!("•••• {last_four}")
    }
}

/// Group a card number into blocks of four (`4242424242424242` →
/// `4242 4242 4242 4242`).
#[must_use]
pub fn format_card_number(value: &str) -> String {
    let compact: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Insert the slash into an expiry date (`1227` → `12/27`). Non-digits are
/// dropped; fewer than four digits are returned as-is.
#[must_use]
pub fn format_expiry_date(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return digits;
    }
    let (month, year) = digits.split_at(2);
    format!("{month}/{year}")
}

/// Receipt for a completed (simulated) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub reference: String,
    pub email: String,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    /// Snapshot the cart and contact email at placement time.
    #[must_use]
    pub fn from_cart(
        reference: String,
        cart: &CartStore,
        shipping: &ShippingInfo,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let summary = cart.summary();
        Self {
            reference,
            email: shipping.email.trim().to_string(),
            items: cart.items().to_vec(),
            subtotal: summary.subtotal,
            tax: summary.tax,
            total: summary.total,
            placed_at,
        }
    }
}

/// Reasons a checkout transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("checkout is at the {actual:?} step, expected {expected:?}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
    #[error("order is already being processed")]
    AlreadyProcessing,
    #[error("cart is empty")]
    EmptyCart,
    #[error("{} field(s) need attention", .0.len())]
    Invalid(ValidationErrors),
}

/// State of one visitor's checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    shipping: ShippingInfo,
    payment: PaymentInfo,
    processing_since: Option<DateTime<Utc>>,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a checkout with the shipping email pre-filled.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let mut flow = Self::new();
        flow.shipping.email = email.to_string();
        flow
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    #[must_use]
    pub const fn payment(&self) -> &PaymentInfo {
        &self.payment
    }

    #[must_use]
    pub const fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    /// Whether a placement started within the processing window.
    #[must_use]
    pub fn is_processing(&self, now: DateTime<Utc>) -> bool {
        self.processing_since
            .is_some_and(|since| now - since < TimeDelta::seconds(PROCESSING_WINDOW_SECS))
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Store the shipping form and advance to Payment when it is complete.
    ///
    /// The submitted values are kept even when invalid so the form can be
    /// shown again.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the Shipping step,
    /// [`CheckoutError::Invalid`] when a required field is missing.
    pub fn submit_shipping(&mut self, info: ShippingInfo) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        let errors = info.validate();
        self.shipping = info;
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Store the payment form and advance to Review when it is complete.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the Payment step,
    /// [`CheckoutError::Invalid`] when a required field is missing.
    pub fn submit_payment(&mut self, info: PaymentInfo) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        let errors = info.validate();
        self.payment = info.normalized();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Return to the previous form step. Shipping and Complete stay put.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::AlreadyProcessing`] while an order is being placed.
    pub fn back(&mut self, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        if self.is_processing(now) {
            return Err(CheckoutError::AlreadyProcessing);
        }
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            other => other,
        };
        Ok(())
    }

    /// Lock the flow for placement. Further input is refused until
    /// [`complete`](Self::complete) or the processing window lapses.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside Review,
    /// [`CheckoutError::AlreadyProcessing`] if a placement is in flight,
    /// [`CheckoutError::EmptyCart`] with nothing to buy,
    /// [`CheckoutError::Invalid`] if the payment details no longer validate.
    pub fn begin_placement(
        &mut self,
        cart: &CartStore,
        now: DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        if self.is_processing(now) {
            return Err(CheckoutError::AlreadyProcessing);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let errors = self.payment.validate();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }
        self.processing_since = Some(now);
        Ok(())
    }

    /// Finish the placement: record the confirmation, forget the card
    /// details, and move to Complete.
    pub fn complete(&mut self, confirmation: OrderConfirmation) {
        self.processing_since = None;
        self.payment = PaymentInfo::default();
        self.confirmation = Some(confirmation);
        self.step = CheckoutStep::Complete;
    }
}
