use std::fmt;

/// Adresse MAC illisible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacParseError(pub String);

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid MAC address '{}'", self.0)
    }
}

impl std::error::Error for MacParseError {}

/// Normalise une adresse MAC en `AA:BB:CC:DD:EE:FF`.
///
/// Accepte `:` ou `-` comme séparateur, ou aucun séparateur (12 chiffres
/// hexadécimaux), quelle que soit la casse.
pub fn normalize_mac(raw: &str) -> Result<String, MacParseError> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect();

    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MacParseError(raw.to_string()));
    }

    let upper = digits.to_ascii_uppercase();
    let octets: Vec<&str> = (0..6).map(|i| &upper[i * 2..i * 2 + 2]).collect();
    Ok(octets.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mac_separators() {
        assert_eq!(normalize_mac("b8:e9:37:24:c8:00").unwrap(), "B8:E9:37:24:C8:00");
        assert_eq!(normalize_mac("B8-E9-37-24-C8-00").unwrap(), "B8:E9:37:24:C8:00");
        assert_eq!(normalize_mac("b8e93724c800").unwrap(), "B8:E9:37:24:C8:00");
    }

    #[test]
    fn test_normalize_mac_rejects_garbage() {
        assert!(normalize_mac("").is_err());
        assert!(normalize_mac("b8:e9:37:24:c8").is_err());
        assert!(normalize_mac("zz:e9:37:24:c8:00").is_err());
    }
}
