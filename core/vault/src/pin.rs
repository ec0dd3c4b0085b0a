//! PIN format rules.

use pinvault_common::{Error, Result};

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// Check that `pin` is exactly four ASCII digits.
///
/// # Errors
/// - `InvalidPin` on any other length or character
pub fn validate_pin_format(pin: &str) -> Result<()> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidPin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pins() {
        for pin in ["0000", "1234", "9999", "0420"] {
            assert!(validate_pin_format(pin).is_ok(), "{pin}");
        }
    }

    #[test]
    fn test_invalid_pins() {
        for pin in ["", "123", "12345", "12a4", " 123", "１２３４", "-123"] {
            assert!(
                matches!(validate_pin_format(pin), Err(Error::InvalidPin)),
                "{pin:?}"
            );
        }
    }
}
