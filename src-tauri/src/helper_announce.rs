use crate::helper_supervisor::HelperError;

/// Parses the helper's first stdout line: the TCP port it bound to.
pub fn parse_port_announcement(line: &str) -> Result<u16, HelperError> {
    let trimmed = line.trim();
    match trimmed.parse::<u16>() {
        Ok(0) | Err(_) => Err(HelperError::InvalidAnnouncement(trimmed.to_string())),
        Ok(port) => Ok(port),
    }
}

pub fn format_port_announcement(port: u16) -> String {
    format!("{port}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_port_with_surrounding_whitespace() {
        assert_eq!(parse_port_announcement(" 51234\r\n").unwrap(), 51234);
    }

    #[test]
    fn rejects_zero_garbage_and_out_of_range() {
        for line in ["0", "", "listening on 8080", "70000", "-1"] {
            assert!(
                matches!(
                    parse_port_announcement(line),
                    Err(HelperError::InvalidAnnouncement(_))
                ),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn formatted_announcement_parses_back() {
        let line = format_port_announcement(40123);
        assert_eq!(parse_port_announcement(&line).unwrap(), 40123);
    }
}
