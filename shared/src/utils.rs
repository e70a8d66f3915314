// Formatting helpers shared by the engine and any other consumer of the models.

/// Formats `value` with at most `decimals` fractional digits, trimming
/// trailing zeros (and a dangling decimal point).
pub fn format_trimmed(value: f64, decimals: usize) -> String {
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "chart".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_trimmed() {
        assert_eq!(format_trimmed(12.500, 2), "12.5");
        assert_eq!(format_trimmed(12.0, 3), "12");
        assert_eq!(format_trimmed(0.126, 2), "0.13");
        assert_eq!(format_trimmed(-0.0001, 2), "0");
        assert_eq!(format_trimmed(1500.0, 0), "1500");
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("BTC/USDT"), "BTC_USDT");
        assert_eq!(sanitize_file_component("  "), "chart");
        assert_eq!(sanitize_file_component("my-chart_1"), "my-chart_1");
    }
}
