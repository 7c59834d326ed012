//! Input validation for API requests.
//!
//! Validators return `Err(message)` describing the first problem found.
//! Collect several of them with `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::Role;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)+$"
    ).unwrap();

    /// International phone numbers, optional leading +, 7-15 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if name.chars().count() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate a phone number. Spaces and dashes are ignored.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let compact: String = phone.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if !PHONE_REGEX.is_match(&compact) {
        return Err("Invalid phone number".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    Ok(())
}

/// Parse the role of a self-registering account. Only clients and
/// providers can sign up.
pub fn parse_registration_role(role: &str) -> Result<Role, String> {
    match role.parse::<Role>() {
        Ok(role @ (Role::Client | Role::Provider)) => Ok(role),
        Ok(_) => Err("Only CLIENT or PROVIDER accounts can be registered".to_string()),
        Err(_) if role.is_empty() => Err("Role is required".to_string()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("wanjiru@example.co.ke").is_ok());
        assert!(validate_email("first.last+kind@mail.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("spaces in@mail.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+254712345678").is_ok());
        assert!(validate_phone("0712 345 678").is_ok());
        assert!(validate_phone("+254-712-345-678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+2547abc").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_name_and_password() {
        assert!(validate_name("Otieno").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(101)).is_err());

        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_parse_registration_role() {
        assert_eq!(parse_registration_role("client"), Ok(Role::Client));
        assert_eq!(parse_registration_role("PROVIDER"), Ok(Role::Provider));
        assert!(parse_registration_role("ADMIN").is_err());
        assert!(parse_registration_role("SYSTEM").is_err());
        assert_eq!(parse_registration_role(""), Err("Role is required".to_string()));
        assert!(parse_registration_role("plumber").is_err());
    }
}
