// Error handling utilities for consistent error messages and exit codes

use std::process;

use crate::repo::RowRef;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a row number is a non-negative integer
pub fn validate_row_id(id_str: &str) -> Result<usize, String> {
    id_str
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid row: '{}'. Row must be a non-negative number.", id_str))
}

/// Parse a row argument; `latest` or no argument selects the most recent row
pub fn parse_row_ref(row: Option<&str>) -> Result<RowRef, String> {
    match row {
        None => Ok(RowRef::Latest),
        Some(s) if s.trim().eq_ignore_ascii_case("latest") => Ok(RowRef::Latest),
        Some(s) => validate_row_id(s).map(RowRef::At),
    }
}

/// Validate that free text joined from arguments is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_row_id() {
        assert_eq!(validate_row_id("0"), Ok(0));
        assert_eq!(validate_row_id(" 12 "), Ok(12));
        assert!(validate_row_id("-1").is_err());
        assert!(validate_row_id("abc").is_err());
    }

    #[test]
    fn test_parse_row_ref() {
        assert_eq!(parse_row_ref(None), Ok(RowRef::Latest));
        assert_eq!(parse_row_ref(Some("latest")), Ok(RowRef::Latest));
        assert_eq!(parse_row_ref(Some("3")), Ok(RowRef::At(3)));
        assert!(parse_row_ref(Some("x")).is_err());
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("  ", "Task").is_err());
        assert!(validate_non_empty("42", "Task").is_ok());
    }
}
