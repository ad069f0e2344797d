use super::domain::Amount;

/// Formats an amount as INR with Indian digit grouping, e.g. `₹12,34,567`.
pub fn format_currency(amount: Amount) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = group_indian(&digits);
    if amount < 0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

/// Last three digits form one group; every group before it has two.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_lakhs_and_crores() {
        assert_eq!(format_currency(0), "₹0");
        assert_eq!(format_currency(999), "₹999");
        assert_eq!(format_currency(1_000), "₹1,000");
        assert_eq!(format_currency(100_000), "₹1,00,000");
        assert_eq!(format_currency(12_345_678), "₹1,23,45,678");
        assert_eq!(format_currency(-8_885), "-₹8,885");
    }

    #[test]
    fn percentages_keep_two_decimals() {
        assert_eq!(format_percentage(12.0), "12.00%");
        assert_eq!(format_percentage(66.666), "66.67%");
    }
}
