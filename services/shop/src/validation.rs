//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::error::{ShopError, ShopResult};

const MAX_ADDRESS_LENGTH: usize = 500;

/// Validate username
pub fn validate_username(username: &str) -> ShopResult<()> {
    let username = username.trim();
    if username.is_empty() {
        return invalid("Username is required");
    }

    if username.chars().count() > 32 {
        return invalid("Username must be at most 32 characters long");
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.\-]+$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return invalid("Username can only contain letters, numbers, '_', '.' and '-'");
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> ShopResult<()> {
    if email.is_empty() {
        return invalid("Email is required");
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("Failed to compile email regex"));

    if !regex.is_match(email) {
        return invalid("Invalid email format");
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> ShopResult<()> {
    if password.is_empty() {
        return invalid("Password is required");
    }

    let length = password.chars().count();
    if length < 6 {
        return invalid("Password must be at least 6 characters long");
    }

    if length > 128 {
        return invalid("Password must be at most 128 characters long");
    }

    Ok(())
}

/// Trimmed delivery address; absent means empty
pub fn normalize_address(address: Option<&str>) -> ShopResult<String> {
    let address = address.unwrap_or_default().trim();
    if address.chars().count() > MAX_ADDRESS_LENGTH {
        return invalid("Address must be at most 500 characters long");
    }
    Ok(address.to_string())
}

pub fn validate_product(name: &str, price: Decimal) -> ShopResult<()> {
    if name.trim().is_empty() {
        return invalid("Product name is required");
    }

    if price <= Decimal::ZERO {
        return invalid("Price must be greater than zero");
    }

    Ok(())
}

fn invalid<T>(message: &str) -> ShopResult<T> {
    Err(ShopError::Validation(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.l-i_ce9").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("alice!").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("a@x").is_ok());
        assert!(validate_email("ax.com").is_err());
        assert!(validate_email("a@@x.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_address_is_trimmed() {
        assert_eq!(
            normalize_address(Some("  Main St 1 ")).unwrap(),
            "Main St 1"
        );
        assert_eq!(normalize_address(None).unwrap(), "");
    }

    #[test]
    fn test_address_length_limit() {
        let longest = "x".repeat(MAX_ADDRESS_LENGTH);
        assert_eq!(normalize_address(Some(&longest)).unwrap(), longest);

        let result = normalize_address(Some(&"x".repeat(MAX_ADDRESS_LENGTH + 1)));
        assert!(matches!(
            result,
            Err(ShopError::Validation(message)) if message.contains("500 characters")
        ));
        // Surrounding whitespace does not count towards the limit
        let padded = format!("  {longest}  ");
        assert_eq!(normalize_address(Some(&padded)).unwrap(), longest);
    }

    #[test]
    fn test_product_rules() {
        assert!(validate_product("Kettle", Decimal::new(1999, 2)).is_ok());
        assert!(validate_product(" ", Decimal::ONE).is_err());
        assert!(validate_product("Kettle", Decimal::ZERO).is_err());
        assert!(validate_product("Kettle", Decimal::new(-1, 0)).is_err());
    }
}
