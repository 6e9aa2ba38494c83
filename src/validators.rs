//! Input validation and sanitization functions for fwbridge
//!
//! Every caller-supplied rule field passes through here before it can reach
//! an argument vector handed to the privileged firewall primitive.

use serde::{Deserialize, Serialize};

/// Maximum length of a rule name after sanitization
pub const MAX_NAME_LEN: usize = 255;

/// What to do when sanitization would change caller input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizePolicy {
    /// Silently drop disallowed characters (`My;App` becomes `MyApp`)
    #[default]
    Strip,
    /// Fail validation instead of altering the input
    Reject,
}

/// Sanitizes a rule name for safe use as a primitive argument.
///
/// Keeps ASCII alphanumerics, underscore, hyphen and space. Everything else
/// (shell metacharacters, quotes, path separators, tabs, newlines, non-ASCII)
/// is removed.
///
/// SECURITY: ASCII-only so Unicode lookalikes cannot slip through.
///
/// # Examples
///
/// ```
/// use fwbridge::validators::sanitize_name;
///
/// assert_eq!(sanitize_name("My;Web App"), "MyWeb App");
/// assert_eq!(sanitize_name("a$(reboot)b"), "arebootb");
/// ```
pub fn sanitize_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect()
}

/// Sanitizes a port specification, keeping only digits, commas and hyphens.
///
/// ```
/// use fwbridge::validators::sanitize_port;
///
/// assert_eq!(sanitize_port("80, 443; rm -rf"), "80,443-");
/// ```
pub fn sanitize_port(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '-'))
        .collect()
}

/// Validates and sanitizes a rule name.
///
/// Leading and trailing spaces are trimmed, matching how the name later
/// appears in a listing.
///
/// # Errors
///
/// Returns `Err` if:
/// - `policy` is [`SanitizePolicy::Reject`] and the input has disallowed characters
/// - The name is blank after sanitization
/// - The name exceeds [`MAX_NAME_LEN`]
pub fn validate_name(input: &str, policy: SanitizePolicy) -> Result<String, String> {
    let sanitized = sanitize_name(input);

    if policy == SanitizePolicy::Reject && sanitized != input {
        return Err("Rule name contains invalid characters.".to_string());
    }

    let sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        return Err("Rule name contains no valid characters.".to_string());
    }

    if sanitized.len() > MAX_NAME_LEN {
        return Err(format!("Rule name too long (max {MAX_NAME_LEN} characters)."));
    }

    Ok(sanitized)
}

/// Validates and sanitizes a port specification.
///
/// Accepts a comma-separated list of single ports (`443`) and ranges
/// (`8000-8100`), each between 1 and 65535.
///
/// # Errors
///
/// Returns `Err` if:
/// - `policy` is [`SanitizePolicy::Reject`] and the input has disallowed characters
/// - Any list element is empty, out of range, or an inverted range
pub fn validate_port_spec(input: &str, policy: SanitizePolicy) -> Result<String, String> {
    let sanitized = sanitize_port(input);

    if policy == SanitizePolicy::Reject && sanitized != input {
        return Err("Port contains invalid characters.".to_string());
    }

    if sanitized.is_empty() {
        return Err("Invalid port specification.".to_string());
    }

    for entry in sanitized.split(',') {
        parse_port_entry(entry)?;
    }

    Ok(sanitized)
}

/// Parses one list element: `N` or `N-M`
fn parse_port_entry(entry: &str) -> Result<(u16, u16), String> {
    let invalid = || "Invalid port specification.".to_string();

    match entry.split_once('-') {
        Some((start, end)) => {
            let start = start.parse::<u16>().map_err(|_| invalid())?;
            let end = end.parse::<u16>().map_err(|_| invalid())?;
            validate_port_range(start, end)
        }
        None => {
            let port = entry.parse::<u16>().map_err(|_| invalid())?;
            validate_port(port).map(|p| (p, p))
        }
    }
}

/// Validates a single port number.
///
/// # Errors
///
/// Returns `Err` if port is 0 (reserved).
pub fn validate_port(port: u16) -> Result<u16, String> {
    if port == 0 {
        Err("Port must be between 1 and 65535".to_string())
    } else {
        Ok(port)
    }
}

/// Validates a port range.
///
/// # Errors
///
/// Returns `Err` if:
/// - Either port is 0
/// - Start port is greater than end port
pub fn validate_port_range(start: u16, end: u16) -> Result<(u16, u16), String> {
    validate_port(start)?;
    validate_port(end)?;

    if start > end {
        Err("Start port must be less than or equal to end port".to_string())
    } else {
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name_normal() {
        assert_eq!(sanitize_name("Allow_RDP-1 Test"), "Allow_RDP-1 Test");
    }

    #[test]
    fn test_sanitize_name_removes_shell_metacharacters() {
        let dangerous = "a;b|c&d$e`f>g<h\"i'j\\k/l(m)n*o";
        assert_eq!(sanitize_name(dangerous), "abcdefghijklmno");
    }

    #[test]
    fn test_sanitize_name_removes_control_whitespace() {
        assert_eq!(sanitize_name("Web\nApp\tX\r"), "WebAppX");
    }

    #[test]
    fn test_sanitize_name_unicode() {
        assert_eq!(sanitize_name("Tëst"), "Tst");
    }

    #[test]
    fn test_sanitize_port_keeps_lists_and_ranges() {
        assert_eq!(sanitize_port("80,443"), "80,443");
        assert_eq!(sanitize_port("8000-8100"), "8000-8100");
        assert_eq!(sanitize_port(" 22 ; echo"), "22");
    }

    #[test]
    fn test_validate_name_blank_after_sanitize() {
        assert!(validate_name(";;;", SanitizePolicy::Strip).is_err());
        assert!(validate_name("   ", SanitizePolicy::Strip).is_err());
    }

    #[test]
    fn test_validate_name_trims_surrounding_spaces() {
        assert_eq!(validate_name("  Web  ", SanitizePolicy::Strip), Ok("Web".to_string()));
        assert_eq!(validate_name(" ;Web", SanitizePolicy::Strip), Ok("Web".to_string()));
        assert_eq!(validate_name("  Web", SanitizePolicy::Reject), Ok("Web".to_string()));
    }

    #[test]
    fn test_validate_name_too_long() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name(&long, SanitizePolicy::Strip).is_err());
        let max = "a".repeat(MAX_NAME_LEN);
        assert_eq!(validate_name(&max, SanitizePolicy::Strip).unwrap(), max);
    }

    #[test]
    fn test_validate_name_reject_policy() {
        assert!(validate_name("My;App", SanitizePolicy::Reject).is_err());
        assert_eq!(
            validate_name("My App", SanitizePolicy::Reject).unwrap(),
            "My App"
        );
    }

    #[test]
    fn test_validate_port_spec_valid() {
        for spec in ["22", "80,443", "8000-8100", "1,2-3,65535"] {
            assert_eq!(validate_port_spec(spec, SanitizePolicy::Strip).unwrap(), spec);
        }
    }

    #[test]
    fn test_validate_port_spec_invalid() {
        for spec in ["0", "70000", "443-80", "80,", ",80", "-", "1-2-3", "abc"] {
            assert!(
                validate_port_spec(spec, SanitizePolicy::Strip).is_err(),
                "{spec} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_port_spec_strips_then_checks() {
        assert_eq!(
            validate_port_spec("80, 443", SanitizePolicy::Strip).unwrap(),
            "80,443"
        );
        assert!(validate_port_spec("80, 443", SanitizePolicy::Reject).is_err());
    }

    #[test]
    fn test_validate_port_range() {
        assert_eq!(validate_port_range(80, 443), Ok((80, 443)));
        assert!(validate_port_range(443, 80).is_err());
        assert!(validate_port_range(0, 80).is_err());
    }
}
