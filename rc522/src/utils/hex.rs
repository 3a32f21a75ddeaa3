/// Render bytes as contiguous lowercase hex, e.g. `b479f7d7`.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Render bytes as space-separated lowercase hex, e.g. `b4 79 f7 d7`.
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formats() {
        let b = [0xDE, 0xAD, 0x01];
        assert_eq!(bytes_to_hex(&b), "dead01");
        assert_eq!(bytes_to_hex_spaced(&b), "de ad 01");
        assert_eq!(bytes_to_hex(&[]), "");
    }
}
