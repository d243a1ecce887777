//! Typed records for the three persisted tables.
//!
//! Rows leave the store as these models; nothing downstream handles
//! loosely shaped maps.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;

pub mod customer;
pub mod product;
pub mod sale;

pub use customer::{Entity as Customer, Model as CustomerModel, NewCustomer};
pub use product::{Entity as Product, Model as ProductModel, NewProduct};
pub use sale::{Entity as Sale, Model as SaleModel, NewSale, SaleDetail};

/// Trims a free-text field and folds blank input into `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes user input and runs its field validators in one step.
pub trait Checked: Validate + Sized {
    fn normalized(self) -> Self;

    fn checked(self) -> Result<Self, ServiceError> {
        let input = self.normalized();
        input.validate()?;
        Ok(input)
    }
}

pub(crate) fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Largest value a DECIMAL(10, 2) money column holds.
pub const MAX_MONEY: Decimal = dec!(99999999.99);

/// Money fields are non-negative with at most two decimal places and fit
/// DECIMAL(10, 2).
pub(crate) fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    let (code, message) = if value.is_sign_negative() && !value.is_zero() {
        ("non_negative", "must not be negative")
    } else if *value > MAX_MONEY {
        ("max_money", "must not exceed 99999999.99")
    } else if value.normalize().scale() > 2 {
        ("money_scale", "must have at most two decimal places")
    } else {
        return Ok(());
    };
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some(" Furniture ".into())),
            Some("Furniture".to_string())
        );
    }

    #[test]
    fn negative_zero_is_accepted() {
        assert!(validate_money(&dec!(-0.00)).is_ok());
        assert!(validate_money(&dec!(0)).is_ok());
        assert!(validate_money(&dec!(-0.01)).is_err());
    }

    #[test]
    fn money_fits_the_column() {
        assert_eq!(MAX_MONEY, dec!(99999999.99));
        assert!(validate_money(&MAX_MONEY).is_ok());
        assert!(validate_money(&dec!(12.500)).is_ok());

        let err = validate_money(&dec!(100000000.00)).unwrap_err();
        assert_eq!(err.code, "max_money");
        let err = validate_money(&dec!(50000000000000000000000000000)).unwrap_err();
        assert_eq!(err.code, "max_money");
        let err = validate_money(&dec!(1.005)).unwrap_err();
        assert_eq!(err.code, "money_scale");
    }
}
