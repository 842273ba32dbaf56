//! Rough deployment gas estimate from bytecode size

/// Intrinsic transaction cost
pub const BASE_GAS: u64 = 21_000;

/// Charged per byte of creation code
pub const GAS_PER_BYTE: u64 = 200;

/// Estimates gas for hex-encoded bytecode; `None` when there is no bytecode
pub fn estimate(bytecode: &str) -> Option<u64> {
    let hex = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    if hex.is_empty() {
        return None;
    }
    let bytes = (hex.len() / 2) as u64;
    Some(BASE_GAS + bytes * GAS_PER_BYTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate() {
        assert_eq!(estimate("6080604052"), Some(21_000 + 5 * 200));
        assert_eq!(estimate("0x6080604052"), Some(22_000));
    }

    #[test]
    fn test_odd_length_rounds_down() {
        assert_eq!(estimate("608"), Some(21_200));
    }

    #[test]
    fn test_no_bytecode() {
        assert_eq!(estimate(""), None);
        assert_eq!(estimate("0x"), None);
    }
}
