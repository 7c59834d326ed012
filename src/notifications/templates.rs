//! SMS message templates.
//!
//! Placeholders are written `{name}` and filled from the intent parameters.
//! Placeholders without a matching parameter are left as-is.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

use super::DeliveryError;

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
}

pub const REQUEST_APPROVED_ADMIN: &str = "request_approved.admin";
pub const REQUEST_APPROVED_CLIENT: &str = "request_approved.client";
pub const REQUEST_APPROVED_PROVIDER: &str = "request_approved.provider";
pub const PROVIDER_STATUS_ADMIN: &str = "provider_status.admin";
pub const PROVIDER_STATUS_PROVIDER: &str = "provider_status.provider";

pub type TemplateParams = BTreeMap<&'static str, String>;

fn template_body(template_id: &str) -> Option<&'static str> {
    let body = match template_id {
        REQUEST_APPROVED_ADMIN => {
            "KIND Alert: Request #{request_id} approved.\nClient: {client_name}\nProvider: {provider_name}"
        }
        REQUEST_APPROVED_CLIENT => {
            "Hello {client_name}, your request to {provider_name} has been approved. Terms & 50% deposit apply."
        }
        REQUEST_APPROVED_PROVIDER => {
            "Hello {provider_name}, {client_name} has an approved job request for you. Open KIND to reply."
        }
        PROVIDER_STATUS_ADMIN => {
            "KIND Alert: Provider {status}!\nName: {provider_name}\nEmail: {provider_email}"
        }
        PROVIDER_STATUS_PROVIDER => "Hello {provider_name}, your account has been {status}.",
        _ => return None,
    };
    Some(body)
}

/// Render a template with its parameters
pub fn render(template_id: &str, params: &TemplateParams) -> Result<String, DeliveryError> {
    let body = template_body(template_id)
        .ok_or_else(|| DeliveryError::UnknownTemplate(template_id.to_string()))?;

    // Single pass over the body so parameter values are never re-expanded
    let text = PLACEHOLDER_REGEX.replace_all(body, |caps: &Captures| {
        params
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(text.into_owned())
}
