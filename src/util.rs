//! Count formatting for the dashboard's stat cards.
//!
//! Counts arrive as strings, sometimes already grouped (`"32 215"`). Large
//! values collapse to thousands (`"135k"`), smaller ones are grouped with
//! spaces. Anything without a leading integer is returned as given.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("invalid leading integer regex"));

pub fn format_number(number: &str) -> String {
    let compact: String = number.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(num) = LEADING_INTEGER
        .find(&compact)
        .and_then(|m| m.as_str().parse::<i64>().ok())
    else {
        return number.to_string();
    };

    if num >= 100_000 {
        format!("{}k", num / 1000)
    } else {
        group_thousands(num)
    }
}

fn group_thousands(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
