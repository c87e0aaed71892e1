use humansize::{format_size, BINARY};

/// Parses a byte count with an optional `B`/`K`/`M`/`G`/`T` suffix.
/// Suffixes are 1024-based; a missing suffix means bytes.
pub fn parse_byte_count(s: &str) -> Result<u64, String>
{
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte count".to_string());
    }

    let (digits, shift) = match s.as_bytes()[s.len() - 1].to_ascii_uppercase() {
        b'B' => (&s[..s.len() - 1], 0),
        b'K' => (&s[..s.len() - 1], 10),
        b'M' => (&s[..s.len() - 1], 20),
        b'G' => (&s[..s.len() - 1], 30),
        b'T' => (&s[..s.len() - 1], 40),
        _ => (s, 0),
    };

    let n: u64 = digits.trim().parse()
        .map_err(|_| format!("{:?} is not a byte count", s))?;

    n.checked_shl(shift)
        .filter(|v| v >> shift == n)
        .ok_or_else(|| format!("{:?} overflows a byte count", s))
}


/// Formats a byte count in human units (binary prefixes).
pub fn human_bytes(n: u64) -> String
{
    format_size(n, BINARY)
}


// Tests.


#[cfg(test)]
mod tests {
    use super::parse_byte_count;

    #[test]
    fn plain_number()
    {
        assert_eq!(parse_byte_count("0"), Ok(0));
        assert_eq!(parse_byte_count("4096"), Ok(4096));
    }

    #[test]
    fn explicit_bytes()
    {
        assert_eq!(parse_byte_count("512B"), Ok(512));
        assert_eq!(parse_byte_count("512b"), Ok(512));
    }

    #[test]
    fn suffixes_are_1024_based()
    {
        assert_eq!(parse_byte_count("1K"), Ok(1024));
        assert_eq!(parse_byte_count("8K"), Ok(8192));
        assert_eq!(parse_byte_count("64M"), Ok(64 * 1024 * 1024));
        assert_eq!(parse_byte_count("2G"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_byte_count("1T"), Ok(1u64 << 40));
    }

    #[test]
    fn lowercase_suffix()
    {
        assert_eq!(parse_byte_count("3m"), Ok(3 * 1024 * 1024));
    }

    #[test]
    fn garbage_is_rejected()
    {
        assert!(parse_byte_count("").is_err());
        assert!(parse_byte_count("K").is_err());
        assert!(parse_byte_count("12Q").is_err());
        assert!(parse_byte_count("-1").is_err());
        assert!(parse_byte_count("1.5M").is_err());
    }

    #[test]
    fn overflow_is_rejected()
    {
        assert!(parse_byte_count("18446744073709551615T").is_err());
    }
}
