//! Display formatting for amounts and rates

/// Fewest fraction digits shown for a rate
const RATE_MIN_DECIMALS: usize = 4;

/// Most fraction digits shown for a rate
const RATE_MAX_DECIMALS: usize = 6;

/// Formats an amount with exactly two fraction digits and comma thousands grouping
///
/// `1234.5` becomes `"1,234.50"`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(whole), fraction)
}

/// Formats a rate with between four and six fraction digits and no grouping
///
/// `0.92` becomes `"0.9200"`, `0.006734` stays `"0.006734"`.
pub fn format_rate(rate: f64) -> String {
    let mut text = format!("{:.*}", RATE_MAX_DECIMALS, rate);
    let min_len = text.len() - (RATE_MAX_DECIMALS - RATE_MIN_DECIMALS);
    while text.len() > min_len && text.ends_with('0') {
        text.pop();
    }
    text
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
