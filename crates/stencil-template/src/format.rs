/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Formatter library.
//!
//! Formatters are pure functions applied left-to-right in a pipeline:
//! `${total|currency:USD|bold}`. The five styling formatters wrap the value
//! with character formatting; every other formatter operates on the
//! underlying value of a styled input and keeps the wrapper intact.
//! Unknown formatter names warn and pass the value through unchanged.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::ast::FormatterCall;
use crate::eval_context::EvalContext;
use crate::value::{Style, Value};
use crate::xmltext::escape_xml;

enum Formatter {
    /// Value transformation; styled inputs are unwrapped and re-wrapped.
    Plain(fn(&Value, &[String], DateTime<Utc>) -> Value),
    /// Style attachment; `None` means the arguments were invalid.
    Styling(fn(&[String]) -> Option<Style>),
}

static REGISTRY: Lazy<HashMap<&'static str, Formatter>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Formatter> = HashMap::new();
    m.insert("upper", Formatter::Plain(fmt_upper));
    m.insert("lower", Formatter::Plain(fmt_lower));
    m.insert("capitalize", Formatter::Plain(fmt_capitalize));
    m.insert("trim", Formatter::Plain(fmt_trim));
    m.insert("currency", Formatter::Plain(fmt_currency));
    m.insert("number", Formatter::Plain(fmt_number));
    m.insert("percent", Formatter::Plain(fmt_percent));
    m.insert("round", Formatter::Plain(fmt_round));
    m.insert("date", Formatter::Plain(fmt_date));
    m.insert("dateTime", Formatter::Plain(fmt_date_time));
    m.insert("fromNow", Formatter::Plain(fmt_from_now));
    m.insert("join", Formatter::Plain(fmt_join));
    m.insert("length", Formatter::Plain(fmt_length));
    m.insert("sum", Formatter::Plain(fmt_sum));
    m.insert("count", Formatter::Plain(fmt_count));
    m.insert("avg", Formatter::Plain(fmt_avg));
    m.insert("max", Formatter::Plain(fmt_max));
    m.insert("min", Formatter::Plain(fmt_min));
    m.insert("truncate", Formatter::Plain(fmt_truncate));
    m.insert("default", Formatter::Plain(fmt_default));
    m.insert("escape", Formatter::Plain(fmt_escape));
    m.insert("bold", Formatter::Styling(style_bold));
    m.insert("italic", Formatter::Styling(style_italic));
    m.insert("underline", Formatter::Styling(style_underline));
    m.insert("size", Formatter::Styling(style_size));
    m.insert("color", Formatter::Styling(style_color));
    m
});

/// Whether `name` is a registered formatter.
pub fn is_known(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// Whether `name` is one of the list aggregates.
pub fn is_aggregate(name: &str) -> bool {
    matches!(name, "sum" | "count" | "avg" | "max" | "min")
}

/// Whether `name` is a styling formatter.
pub fn is_styling(name: &str) -> bool {
    matches!(name, "bold" | "italic" | "underline" | "size" | "color")
}

/// Apply one formatter to a value.
pub fn apply(call: &FormatterCall, value: Value, ctx: &mut EvalContext, offset: usize) -> Value {
    match REGISTRY.get(call.name.as_str()) {
        None => {
            ctx.warn_at(
                format!("unknown formatter '{}'", call.name),
                Some(offset),
            );
            value
        }
        Some(Formatter::Styling(f)) => match f(&call.args) {
            None => {
                ctx.warn_at(
                    format!("invalid arguments for formatter '{}'", call.name),
                    Some(offset),
                );
                value
            }
            Some(new_style) => match value {
                Value::Styled(inner, mut style) => {
                    style.merge(&new_style);
                    Value::Styled(inner, style)
                }
                other => Value::Styled(Box::new(other), new_style),
            },
        },
        Some(Formatter::Plain(f)) => match value {
            Value::Styled(inner, style) => {
                let result = f(&inner, &call.args, ctx.now);
                Value::Styled(Box::new(result), style)
            }
            other => f(&other, &call.args, ctx.now),
        },
    }
}

// ------------------------------------------------------------------- text

fn fmt_upper(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    Value::String(value.to_display().to_uppercase())
}

fn fmt_lower(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    Value::String(value.to_display().to_lowercase())
}

fn fmt_capitalize(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    let s = value.to_display();
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    };
    Value::String(out)
}

fn fmt_trim(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    Value::String(value.to_display().trim().to_string())
}

fn fmt_truncate(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let limit = args
        .first()
        .and_then(|a| a.parse::<usize>().ok())
        .unwrap_or(50);
    let s = value.to_display();
    if s.chars().count() <= limit {
        return Value::String(s);
    }
    let cut: String = s.chars().take(limit).collect();
    Value::String(format!("{}...", cut))
}

fn fmt_default(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let alt = args.first().cloned().unwrap_or_default();
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        Value::String(alt)
    } else {
        value.clone()
    }
}

fn fmt_escape(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    Value::String(escape_xml(&value.to_display()))
}

// ----------------------------------------------------------------- numbers

fn fmt_currency(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let n = value.to_number();
    if n.is_nan() {
        return value.clone();
    }
    let code = args
        .first()
        .map(|c| c.to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string());
    let amount = grouped_fixed(n.abs(), 2);
    let sign = if n < 0.0 { "-" } else { "" };
    let text = match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, amount),
        None => format!("{}{} {}", sign, code, amount),
    };
    Value::String(text)
}

/// Locale-neutral symbols for common ISO 4217 codes.
fn currency_symbol(code: &str) -> Option<&'static str> {
    Some(match code {
        "USD" | "CAD" | "AUD" | "MXN" => "$",
        "EUR" => "\u{20AC}",
        "GBP" => "\u{A3}",
        "JPY" | "CNY" => "\u{A5}",
        "KRW" => "\u{20A9}",
        "INR" => "\u{20B9}",
        "CHF" => "CHF ",
        "SEK" => "kr ",
        "BRL" => "R$",
        _ => return None,
    })
}

/// Fixed-point with thousands grouping: `1234567.5` -> `1,234,567.50`.
fn grouped_fixed(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed, None),
    };
    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

fn fmt_number(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let n = value.to_number();
    if n.is_nan() {
        return value.clone();
    }
    let decimals = args
        .first()
        .and_then(|a| a.parse::<usize>().ok())
        .unwrap_or(2);
    Value::String(format!("{:.*}", decimals, n))
}

fn fmt_percent(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    let n = value.to_number();
    if n.is_nan() {
        return value.clone();
    }
    Value::String(format!("{:.2}%", n * 100.0))
}

fn fmt_round(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let n = value.to_number();
    if n.is_nan() {
        return value.clone();
    }
    let places = args
        .first()
        .and_then(|a| a.parse::<u32>().ok())
        .unwrap_or(0);
    let scale = 10f64.powi(places as i32);
    // f64::round rounds half away from zero.
    Value::Number((n * scale).round() / scale)
}

// ------------------------------------------------------------------- dates

/// Parse a value into a UTC instant: ISO-8601 strings or numeric epochs
/// (seconds, or milliseconds when the magnitude says so).
fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => epoch_to_instant(*n),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
                if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Utc.from_utc_datetime(&ndt));
                }
            }
            if let Ok(nd) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return nd.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
            }
            s.parse::<f64>().ok().and_then(epoch_to_instant)
        }
        _ => None,
    }
}

fn epoch_to_instant(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    if n.abs() >= 1e12 {
        DateTime::from_timestamp_millis(n as i64)
    } else {
        DateTime::from_timestamp(n as i64, 0)
    }
}

/// Translate `YYYY-MM-DD HH:mm:ss` pattern tokens into a chrono format
/// string. Unrecognized characters pass through literally.
fn translate_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let rest: String = chars[i..].iter().collect();
        if rest.starts_with("YYYY") {
            out.push_str("%Y");
            i += 4;
        } else if rest.starts_with("MM") {
            out.push_str("%m");
            i += 2;
        } else if rest.starts_with("DD") {
            out.push_str("%d");
            i += 2;
        } else if rest.starts_with("HH") {
            out.push_str("%H");
            i += 2;
        } else if rest.starts_with("mm") {
            out.push_str("%M");
            i += 2;
        } else if rest.starts_with("ss") {
            out.push_str("%S");
            i += 2;
        } else if chars[i] == '%' {
            out.push_str("%%");
            i += 1;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn fmt_date(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    format_instant(value, args, "YYYY-MM-DD")
}

fn fmt_date_time(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    format_instant(value, args, "YYYY-MM-DD HH:mm:ss")
}

fn format_instant(value: &Value, args: &[String], default_pattern: &str) -> Value {
    let instant = match parse_instant(value) {
        Some(i) => i,
        None => return value.clone(),
    };
    let pattern = args
        .first()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .unwrap_or(default_pattern);
    Value::String(
        instant
            .format(&translate_pattern(pattern))
            .to_string(),
    )
}

fn fmt_from_now(value: &Value, _args: &[String], now: DateTime<Utc>) -> Value {
    let instant = match parse_instant(value) {
        Some(i) => i,
        None => return value.clone(),
    };
    let delta = now.signed_duration_since(instant);
    let past = delta.num_seconds() >= 0;
    let secs = delta.num_seconds().unsigned_abs();

    let phrase = humanize_seconds(secs);
    let text = if past {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    };
    Value::String(text)
}

fn humanize_seconds(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 3600;
    const DAY: u64 = 86_400;

    if secs < 45 {
        "a few seconds".to_string()
    } else if secs < 90 {
        "a minute".to_string()
    } else if secs < 45 * MINUTE {
        format!("{} minutes", (secs + MINUTE / 2) / MINUTE)
    } else if secs < 90 * MINUTE {
        "an hour".to_string()
    } else if secs < 22 * HOUR {
        format!("{} hours", (secs + HOUR / 2) / HOUR)
    } else if secs < 36 * HOUR {
        "a day".to_string()
    } else if secs < 26 * DAY {
        format!("{} days", (secs + DAY / 2) / DAY)
    } else if secs < 45 * DAY {
        "a month".to_string()
    } else if secs < 320 * DAY {
        format!("{} months", (secs + 15 * DAY) / (30 * DAY))
    } else if secs < 548 * DAY {
        "a year".to_string()
    } else {
        format!("{} years", secs / (365 * DAY))
    }
}

// ------------------------------------------------------------------- lists

fn fmt_join(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let sep = args.first().map(String::as_str).unwrap_or(", ");
    match value {
        Value::List(items) => Value::String(
            items
                .iter()
                .map(|v| v.to_display())
                .collect::<Vec<_>>()
                .join(sep),
        ),
        other => other.clone(),
    }
}

fn fmt_length(value: &Value, _args: &[String], _now: DateTime<Utc>) -> Value {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        _ => 0,
    };
    Value::Number(len as f64)
}

/// Pull the aggregation operand out of a list element, following the
/// optional dotted field path.
fn aggregate_operand<'v>(element: &'v Value, field: Option<&str>) -> Option<&'v Value> {
    match field {
        None => Some(element),
        Some(path) => {
            let mut current = element;
            for key in path.split('.') {
                current = current.get_key(key)?;
            }
            Some(current)
        }
    }
}

fn aggregate_numbers(value: &Value, args: &[String]) -> Option<Vec<f64>> {
    let field = args.first().map(String::as_str).filter(|f| !f.is_empty());
    match value {
        Value::List(items) => Some(
            items
                .iter()
                .filter_map(|e| aggregate_operand(e, field))
                .map(|v| v.to_number())
                .filter(|n| !n.is_nan())
                .collect(),
        ),
        _ => None,
    }
}

fn fmt_sum(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    match aggregate_numbers(value, args) {
        Some(nums) => Value::Number(nums.iter().sum()),
        None => Value::Null,
    }
}

fn fmt_count(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    let field = args.first().map(String::as_str).filter(|f| !f.is_empty());
    match value {
        Value::List(items) => {
            let n = match field {
                None => items.len(),
                Some(_) => items
                    .iter()
                    .filter_map(|e| aggregate_operand(e, field))
                    .filter(|v| !matches!(v, Value::Null))
                    .count(),
            };
            Value::Number(n as f64)
        }
        _ => Value::Number(0.0),
    }
}

fn fmt_avg(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    match aggregate_numbers(value, args) {
        Some(nums) if !nums.is_empty() => {
            Value::Number(nums.iter().sum::<f64>() / nums.len() as f64)
        }
        _ => Value::Null,
    }
}

fn fmt_max(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    match aggregate_numbers(value, args) {
        Some(nums) => nums
            .into_iter()
            .fold(None::<f64>, |acc, n| {
                Some(acc.map_or(n, |m| m.max(n)))
            })
            .map(Value::Number)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn fmt_min(value: &Value, args: &[String], _now: DateTime<Utc>) -> Value {
    match aggregate_numbers(value, args) {
        Some(nums) => nums
            .into_iter()
            .fold(None::<f64>, |acc, n| {
                Some(acc.map_or(n, |m| m.min(n)))
            })
            .map(Value::Number)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}

// ----------------------------------------------------------------- styling

fn style_bold(_args: &[String]) -> Option<Style> {
    Some(Style {
        bold: true,
        ..Style::default()
    })
}

fn style_italic(_args: &[String]) -> Option<Style> {
    Some(Style {
        italic: true,
        ..Style::default()
    })
}

fn style_underline(_args: &[String]) -> Option<Style> {
    Some(Style {
        underline: true,
        ..Style::default()
    })
}

fn style_size(args: &[String]) -> Option<Style> {
    let n = args.first()?.parse::<u32>().ok()?;
    if !(1..=72).contains(&n) {
        return None;
    }
    Some(Style {
        size: Some(n),
        ..Style::default()
    })
}

fn style_color(args: &[String]) -> Option<Style> {
    let spec = args.first()?.trim();
    let valid = (spec.len() == 6 && spec.chars().all(|c| c.is_ascii_hexdigit()))
        || (!spec.is_empty() && spec.chars().all(|c| c.is_alphabetic()));
    if !valid {
        return None;
    }
    Some(Style {
        color: Some(spec.to_string()),
        ..Style::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> FormatterCall {
        FormatterCall {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn apply_one(name: &str, args: &[&str], value: Value) -> Value {
        let mut ctx = EvalContext::new();
        apply(&call(name, args), value, &mut ctx, 0)
    }

    #[test]
    fn test_text_formatters() {
        assert_eq!(
            apply_one("upper", &[], Value::String("ahead".into())),
            Value::String("AHEAD".into())
        );
        assert_eq!(
            apply_one("capitalize", &[], Value::String("wORLD".into())),
            Value::String("World".into())
        );
        assert_eq!(
            apply_one("trim", &[], Value::String("  x  ".into())),
            Value::String("x".into())
        );
    }

    #[test]
    fn test_currency() {
        assert_eq!(
            apply_one("currency", &["USD"], Value::Number(1234.5)),
            Value::String("$1,234.50".into())
        );
        assert_eq!(
            apply_one("currency", &["EUR"], Value::Number(-9.5)),
            Value::String("-\u{20AC}9.50".into())
        );
        // Any ISO code is accepted; unknown codes render with the code
        assert_eq!(
            apply_one("currency", &["PLN"], Value::Number(10.0)),
            Value::String("PLN 10.00".into())
        );
        // Default code is USD
        assert_eq!(
            apply_one("currency", &[], Value::Number(1_000_000.0)),
            Value::String("$1,000,000.00".into())
        );
    }

    #[test]
    fn test_percent_and_round() {
        assert_eq!(
            apply_one("percent", &[], Value::Number(0.0725)),
            Value::String("7.25%".into())
        );
        assert_eq!(
            apply_one("round", &[], Value::Number(2.5)),
            Value::Number(3.0)
        );
        assert_eq!(
            apply_one("round", &[], Value::Number(-2.5)),
            Value::Number(-3.0)
        );
        assert_eq!(
            apply_one("round", &["1"], Value::Number(0.25)),
            Value::Number(0.3)
        );
    }

    #[test]
    fn test_date_formatters() {
        assert_eq!(
            apply_one("date", &[], Value::String("2026-03-15T10:30:00Z".into())),
            Value::String("2026-03-15".into())
        );
        assert_eq!(
            apply_one("date", &["DD/MM/YYYY"], Value::String("2026-03-15".into())),
            Value::String("15/03/2026".into())
        );
        assert_eq!(
            apply_one("dateTime", &[], Value::Number(0.0)),
            Value::String("1970-01-01 00:00:00".into())
        );
        // Unparseable input passes through
        assert_eq!(
            apply_one("date", &[], Value::String("not a date".into())),
            Value::String("not a date".into())
        );
    }

    #[test]
    fn test_from_now() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut ctx = EvalContext::new().with_now(now);
        let hour_ago = apply(
            &call("fromNow", &[]),
            Value::String("2026-01-01T11:00:00Z".into()),
            &mut ctx,
            0,
        );
        assert_eq!(hour_ago, Value::String("an hour ago".into()));

        let in_days = apply(
            &call("fromNow", &[]),
            Value::String("2026-01-04T12:00:00Z".into()),
            &mut ctx,
            0,
        );
        assert_eq!(in_days, Value::String("in 3 days".into()));
    }

    #[test]
    fn test_join_and_length() {
        let list = Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ]);
        assert_eq!(
            apply_one("join", &[" / "], list.clone()),
            Value::String("a / b / c".into())
        );
        assert_eq!(apply_one("length", &[], list), Value::Number(3.0));
        assert_eq!(
            apply_one("length", &[], Value::Number(7.0)),
            Value::Number(0.0)
        );
    }

    #[test]
    fn test_aggregates() {
        use hashlink::LinkedHashMap;
        let mut a = LinkedHashMap::new();
        a.insert("score".to_string(), Value::Number(95.0));
        let mut b = LinkedHashMap::new();
        b.insert("score".to_string(), Value::Number(87.0));
        let list = Value::List(vec![Value::Record(a), Value::Record(b)]);

        assert_eq!(
            apply_one("sum", &["score"], list.clone()),
            Value::Number(182.0)
        );
        assert_eq!(
            apply_one("avg", &["score"], list.clone()),
            Value::Number(91.0)
        );
        assert_eq!(
            apply_one("max", &["score"], list.clone()),
            Value::Number(95.0)
        );
        assert_eq!(
            apply_one("min", &["score"], list.clone()),
            Value::Number(87.0)
        );
        assert_eq!(apply_one("count", &[], list), Value::Number(2.0));

        let plain = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(apply_one("sum", &[], plain), Value::Number(3.0));
    }

    #[test]
    fn test_truncate_and_default() {
        assert_eq!(
            apply_one("truncate", &["3"], Value::String("abcdef".into())),
            Value::String("abc...".into())
        );
        assert_eq!(
            apply_one("default", &["n/a"], Value::Null),
            Value::String("n/a".into())
        );
        assert_eq!(
            apply_one("default", &["n/a"], Value::String("set".into())),
            Value::String("set".into())
        );
    }

    #[test]
    fn test_styling_wraps_and_merges() {
        let styled = apply_one("bold", &[], Value::String("x".into()));
        match &styled {
            Value::Styled(_, style) => assert!(style.bold),
            _ => panic!("expected styled value"),
        }
        let styled = apply_one("color", &["FF0000"], styled);
        match &styled {
            Value::Styled(_, style) => {
                assert!(style.bold);
                assert_eq!(style.color.as_deref(), Some("FF0000"));
            }
            _ => panic!("expected styled value"),
        }
    }

    #[test]
    fn test_plain_formatter_through_styled() {
        let styled = apply_one("bold", &[], Value::String("hello".into()));
        let result = apply_one("upper", &[], styled);
        match result {
            Value::Styled(inner, style) => {
                assert!(style.bold);
                assert_eq!(*inner, Value::String("HELLO".into()));
            }
            _ => panic!("expected styled value"),
        }
    }

    #[test]
    fn test_unknown_formatter_warns_and_passes_through() {
        let mut ctx = EvalContext::new();
        let value = Value::String("x".into());
        let out = apply(&call("sparkle", &[]), value.clone(), &mut ctx, 7);
        assert_eq!(out, value);
        assert_eq!(ctx.diagnostics.diagnostics().len(), 1);
    }

    #[test]
    fn test_size_range_validation() {
        let mut ctx = EvalContext::new();
        let out = apply(&call("size", &["99"]), Value::String("x".into()), &mut ctx, 0);
        assert_eq!(out, Value::String("x".into()));
        assert!(!ctx.diagnostics.is_empty());
    }
}
