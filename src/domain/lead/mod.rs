//! Lead capture domain module.
//!
//! Validated buyer contact details and the durable lead record handed to
//! the CRM collaborator.

mod contact;
mod errors;
mod record;

pub use contact::BuyerContact;
pub use errors::ContactValidation;
pub use record::Lead;
