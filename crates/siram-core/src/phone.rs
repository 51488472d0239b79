//! Conversion between stored phone numbers and chat addresses.
//!
//! Numbers are stored in local format (`0812…`). Chat addresses use the
//! international form without `+` followed by the user domain
//! (`62812…@s.whatsapp.net`).

/// Country calling code that replaces the local trunk prefix.
pub const COUNTRY_CODE: &str = "62";

/// Local trunk prefix of stored numbers.
pub const TRUNK_PREFIX: &str = "0";

/// Domain suffix of one-to-one chat addresses.
pub const USER_DOMAIN: &str = "@s.whatsapp.net";

/// Domain marker of group chat addresses.
pub const GROUP_DOMAIN: &str = "@g.us";

/// Builds the outbound chat address for a stored phone number.
pub fn to_chat_address(phone: &str) -> String {
    let phone = phone.trim();
    let international = match phone.strip_prefix(TRUNK_PREFIX) {
        Some(rest) => format!("{COUNTRY_CODE}{rest}"),
        None => phone.to_string(),
    };
    format!("{international}{USER_DOMAIN}")
}

/// Derives the stored-format phone number from an inbound chat address.
pub fn phone_from_address(address: &str) -> String {
    let bare = address.replace(USER_DOMAIN, "");
    match bare.strip_prefix(COUNTRY_CODE) {
        Some(rest) => format!("{TRUNK_PREFIX}{rest}"),
        None => bare,
    }
}

/// Returns true for group chat addresses, which are never answered.
pub fn is_group_address(address: &str) -> bool {
    address.contains(GROUP_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let address = to_chat_address("08123456789");
        assert_eq!(address, "628123456789@s.whatsapp.net");
        assert_eq!(phone_from_address(&address), "08123456789");
    }

    #[test]
    fn test_already_international() {
        assert_eq!(to_chat_address("628111"), "628111@s.whatsapp.net");
        assert_eq!(phone_from_address("1555000@s.whatsapp.net"), "1555000");
    }

    #[test]
    fn test_only_leading_prefix_rewritten() {
        assert_eq!(to_chat_address("0800"), "62800@s.whatsapp.net");
        assert_eq!(phone_from_address("626262@s.whatsapp.net"), "06262");
    }

    #[test]
    fn test_group_address() {
        assert!(is_group_address("12036302@g.us"));
        assert!(!is_group_address("628123@s.whatsapp.net"));
    }
}
