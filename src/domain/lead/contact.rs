//! Buyer contact details collected by the capture form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ContactValidation;
use crate::domain::foundation::ValidationError;

/// Basic shape check only; deliverability is the CRM's concern.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

/// Validated buyer contact details.
///
/// All fields are required; the email must look like `local@domain.tld`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerContact {
    name: String,
    address: String,
    phone: String,
    email: String,
    whatsapp: String,
}

impl BuyerContact {
    /// Validates and constructs buyer contact details.
    ///
    /// # Errors
    ///
    /// `ContactValidation` naming every empty or malformed field, so the
    /// capture form can mark them all at once.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        whatsapp: impl Into<String>,
    ) -> Result<Self, ContactValidation> {
        let name = name.into().trim().to_string();
        let address = address.into().trim().to_string();
        let phone = phone.into().trim().to_string();
        let email = email.into().trim().to_string();
        let whatsapp = whatsapp.into().trim().to_string();

        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &name),
            ("address", &address),
            ("phone", &phone),
            ("email", &email),
            ("whatsapp", &whatsapp),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::empty_field(field));
            }
        }
        if !email.is_empty() && !EMAIL_PATTERN.is_match(&email) {
            errors.push(ValidationError::invalid_format(
                "email",
                "does not match local@domain.tld",
            ));
        }

        if !errors.is_empty() {
            return Err(ContactValidation { errors });
        }

        Ok(Self {
            name,
            address,
            phone,
            email,
            whatsapp,
        })
    }

    /// Returns the buyer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the buyer's address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the buyer's phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Returns the buyer's email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the buyer's WhatsApp number.
    pub fn whatsapp(&self) -> &str {
        &self.whatsapp
    }
}
