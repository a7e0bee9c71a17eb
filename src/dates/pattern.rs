//! Translation of dayjs-style date patterns (`MMM DD, YYYY`) into chrono
//! strftime strings.

use regex::Regex;
use std::sync::LazyLock;

/// Longest tokens first so `YYYY` wins over `YY` and `MMMM` over `MM`.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|DD|D|HH|H|hh|h|mm|m|ss|s|SSS|A|a|ZZ|Z")
        .expect("invalid date pattern token regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Parse,
    Format,
}

pub fn to_strftime(pattern: &str, direction: Direction) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut last = 0;

    for token in TOKEN.find_iter(pattern) {
        push_literal(&mut out, &pattern[last..token.start()]);
        let text = token.as_str();
        match text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(literal) => push_literal(&mut out, literal),
            None => out.push_str(item(text, direction)),
        }
        last = token.end();
    }

    push_literal(&mut out, &pattern[last..]);
    out
}

fn item(token: &str, direction: Direction) -> &'static str {
    let parse = direction == Direction::Parse;
    match token {
        "YYYY" => "%Y",
        "YY" => "%y",
        "MMMM" => "%B",
        "MMM" => "%b",
        "MM" => "%m",
        "M" if parse => "%m",
        "M" => "%-m",
        "DD" => "%d",
        "D" if parse => "%d",
        "D" => "%-d",
        "HH" => "%H",
        "H" if parse => "%H",
        "H" => "%-H",
        "hh" => "%I",
        "h" if parse => "%I",
        "h" => "%-I",
        "mm" => "%M",
        "m" if parse => "%M",
        "m" => "%-M",
        "ss" => "%S",
        "s" if parse => "%S",
        "s" => "%-S",
        "SSS" => "%3f",
        "A" => "%p",
        "a" if parse => "%p",
        "a" => "%P",
        // accepts `Z`, `+05:30` and `+0530`
        "ZZ" | "Z" if parse => "%#z",
        "ZZ" => "%z",
        "Z" => "%:z",
        _ => "",
    }
}

fn push_literal(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
    }
}
