use crate::error::{ForecastError, Result};

/// Parse a price series separated by newlines, commas or whitespace. Text after `#`
/// on a line is ignored.
pub fn parse_prices(text: &str) -> Result<Vec<f64>> {
    let mut prices = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();
        for token in content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let price: f64 = token.parse().map_err(|_| {
                ForecastError::InvalidParameters(format!(
                    "line {}: `{token}` is not a number",
                    line_no + 1
                ))
            })?;
            if !price.is_finite() || price <= 0.0 {
                return Err(ForecastError::InvalidParameters(format!(
                    "line {}: price must be positive and finite, got {price}",
                    line_no + 1
                )));
            }
            prices.push(price);
        }
    }
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators_and_comments() {
        let text = "# close prices\n100.0, 101.5\n102 103.25 # tail\n\n104";
        assert_eq!(
            parse_prices(text).unwrap(),
            vec![100.0, 101.5, 102.0, 103.25, 104.0]
        );
    }

    #[test]
    fn rejects_garbage_and_non_positive_values() {
        assert!(parse_prices("100\nabc").is_err());
        assert!(parse_prices("100, 0").is_err());
        assert!(parse_prices("100, -3").is_err());
    }
}
