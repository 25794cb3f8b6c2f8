//! Bluetooth hardware address validation
//!
//! Addresses are checked before any dispatch happens, so a malformed address
//! is always reported as [`CompatError::InvalidAddress`] and never confused
//! with an unsupported capability.

use bluecompat_core::{CompatError, Result};

/// Length of a hardware address in bytes
pub const ADDRESS_LENGTH: usize = 6;

/// Length of the textual form, e.g. `00:11:22:33:AA:BB`
const ADDRESS_STRING_LENGTH: usize = 17;

/// Check a textual address: six upper-case hex pairs separated by colons
pub fn is_valid_address(address: &str) -> bool {
    if address.len() != ADDRESS_STRING_LENGTH {
        return false;
    }
    address.bytes().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            b == b':'
        } else {
            b.is_ascii_digit() || (b'A'..=b'F').contains(&b)
        }
    })
}

/// Parse a textual address into its raw bytes
pub fn parse_address(address: &str) -> Result<[u8; ADDRESS_LENGTH]> {
    if !is_valid_address(address) {
        return Err(CompatError::invalid_address(
            address,
            "expected upper-case form such as 00:11:22:33:AA:BB",
        ));
    }

    let mut bytes = [0u8; ADDRESS_LENGTH];
    for (slot, pair) in bytes.iter_mut().zip(address.split(':')) {
        *slot = u8::from_str_radix(pair, 16)
            .map_err(|e| CompatError::invalid_address(address, e.to_string()))?;
    }
    Ok(bytes)
}

/// Validate a raw address slice
pub fn address_from_bytes(address: &[u8]) -> Result<[u8; ADDRESS_LENGTH]> {
    address.try_into().map_err(|_| {
        CompatError::invalid_address(
            hex::encode(address),
            format!(
                "expected {} bytes, got {}",
                ADDRESS_LENGTH,
                address.len()
            ),
        )
    })
}

/// Format raw bytes as an upper-case textual address
pub fn format_address(address: &[u8; ADDRESS_LENGTH]) -> String {
    address
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("00:11:22:33:AA:BB"));
        assert!(!is_valid_address("00:11:22:33:aa:bb"));
        assert!(!is_valid_address("00-11-22-33-AA-BB"));
        assert!(!is_valid_address("00:11:22:33:AA"));
    }

    #[test]
    fn test_parse_and_format() {
        let bytes = parse_address("00:11:22:33:AA:BB").unwrap();
        assert_eq!(bytes, [0x00, 0x11, 0x22, 0x33, 0xAA, 0xBB]);
        assert_eq!(format_address(&bytes), "00:11:22:33:AA:BB");
    }

    #[test]
    fn test_wrong_length_bytes_rejected() {
        let err = address_from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CompatError::InvalidAddress { .. }));
        assert!(address_from_bytes(&[1, 2, 3, 4, 5, 6]).is_ok());
    }
}
