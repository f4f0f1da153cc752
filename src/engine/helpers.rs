//! Built-in Handlebars helpers.
//!
//! Registers the seven helpers SPEC_FULL.md §4.1 requires: `upper`, `lower`,
//! `formatDate`, `currency`, `ifEquals`, `qrCode`, `barCode`.
//!
//! # Escaping
//!
//! Helpers that emit SVG (`qrCode`, `barCode`) write unescaped output — the
//! SVG markup is the point. Every other helper HTML-escapes its own output,
//! since writing through a helper bypasses Handlebars' automatic escaping
//! of `{{expr}}`.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
};

use super::{barcode, qr};

pub(super) fn register_helpers(registry: &mut Handlebars) {
    registry.register_helper("upper", Box::new(upper_helper));
    registry.register_helper("lower", Box::new(lower_helper));
    registry.register_helper("formatDate", Box::new(format_date_helper));
    registry.register_helper("currency", Box::new(currency_helper));
    registry.register_helper("ifEquals", Box::new(if_equals_helper));
    registry.register_helper("qrCode", Box::new(qr_code_helper));
    registry.register_helper("barCode", Box::new(bar_code_helper));
}

/// Render a JSON value the way handlebars would stringify it bare.
fn display_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_string)
            .collect::<Vec<_>>()
            .join(","),
        serde_json::Value::Object(_) => String::from("[object Object]"),
    }
}

fn param_value<'a>(h: &'a Helper, index: usize) -> serde_json::Value {
    h.param(index)
        .map(|p| p.value().clone())
        .unwrap_or(serde_json::Value::Null)
}

fn param_str(h: &Helper, index: usize) -> Option<String> {
    h.param(index).map(|p| display_string(p.value()))
}

fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = display_string(&param_value(h, 0)).to_uppercase();
    out.write(&handlebars::html_escape(&value))?;
    Ok(())
}

fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = display_string(&param_value(h, 0)).to_lowercase();
    out.write(&handlebars::html_escape(&value))?;
    Ok(())
}

/// Minimum required tokens: `yyyy`, `MM`, `MMM`, `MMMM`, `dd`, `d`, `HH`,
/// `mm`, `ss`. Default format is `"d"` (day of month, no leading zero).
fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = param_str(h, 0).unwrap_or_default();
    let fmt = param_str(h, 1).unwrap_or_else(|| "d".to_string());

    let formatted = parse_and_format_date(&raw, &fmt).unwrap_or_default();
    out.write(&handlebars::html_escape(&formatted))?;
    Ok(())
}

fn parse_and_format_date(raw: &str, fmt: &str) -> Option<String> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    let dt: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .map(|d| d.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| {
                d.and_hms_opt(0, 0, 0).unwrap().and_utc()
            })
        })
        .ok()?;

    Some(apply_date_tokens(&dt, fmt))
}

/// Replace `.NET`-style date tokens with the matching field of `dt`. Longer
/// tokens are matched before shorter ones so `MMMM` isn't partially consumed
/// by the `MM` rule.
fn apply_date_tokens(dt: &chrono::DateTime<chrono::Utc>, fmt: &str) -> String {
    use chrono::Datelike;
    use chrono::Timelike;

    const TOKENS: &[&str] = &["yyyy", "MMMM", "MMM", "MM", "dd", "HH", "mm", "ss", "d"];

    let mut out = String::with_capacity(fmt.len());
    let chars: Vec<char> = fmt.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let remainder: String = chars[i..].iter().collect();
        let matched_token = TOKENS.iter().find(|t| remainder.starts_with(**t));

        if let Some(token) = matched_token {
            let replacement = match *token {
                "yyyy" => format!("{:04}", dt.year()),
                "MMMM" => month_name(dt.month()).to_string(),
                "MMM" => month_name(dt.month())[..3].to_string(),
                "MM" => format!("{:02}", dt.month()),
                "dd" => format!("{:02}", dt.day()),
                "d" => dt.day().to_string(),
                "HH" => format!("{:02}", dt.hour()),
                "mm" => format!("{:02}", dt.minute()),
                "ss" => format!("{:02}", dt.second()),
                _ => unreachable!(),
            };
            out.push_str(&replacement);
            i += token.len();
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    NAMES.get((month.saturating_sub(1)) as usize).copied().unwrap_or("")
}

/// Culture-aware currency formatting. Unknown/unparseable input → empty
/// string; unknown culture codes fall back to `"en-GB"` (case-insensitive
/// lookup).
fn currency_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = param_str(h, 0).unwrap_or_default();
    let culture = param_str(h, 1).unwrap_or_else(|| "en-GB".to_string());

    let formatted = format_currency(&raw, &culture).unwrap_or_default();
    out.write(&handlebars::html_escape(&formatted))?;
    Ok(())
}

struct CultureFormat {
    symbol: &'static str,
    decimal_sep: char,
    thousands_sep: char,
    symbol_after: bool,
}

fn culture_format(culture: &str) -> CultureFormat {
    match culture.to_ascii_lowercase().as_str() {
        "en-us" => CultureFormat { symbol: "$", decimal_sep: '.', thousands_sep: ',', symbol_after: false },
        "de-de" => CultureFormat { symbol: "€", decimal_sep: ',', thousands_sep: '.', symbol_after: true },
        "fr-fr" => CultureFormat { symbol: "€", decimal_sep: ',', thousands_sep: ' ', symbol_after: true },
        "ja-jp" => CultureFormat { symbol: "¥", decimal_sep: '.', thousands_sep: ',', symbol_after: false },
        // "en-gb" and any unrecognised culture.
        _ => CultureFormat { symbol: "£", decimal_sep: '.', thousands_sep: ',', symbol_after: false },
    }
}

fn format_currency(raw: &str, culture: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    let fmt = culture_format(culture);

    let negative = value < 0.0;
    let abs_value = value.abs();
    let cents = (abs_value * 100.0).round() as i64;
    let whole = cents / 100;
    let frac = cents % 100;

    let grouped = group_thousands(whole, fmt.thousands_sep);
    let number = format!("{grouped}{}{:02}", fmt.decimal_sep, frac);

    let body = if fmt.symbol_after {
        format!("{number} {}", fmt.symbol)
    } else {
        format!("{}{number}", fmt.symbol)
    };

    Some(if negative { format!("-{body}") } else { body })
}

fn group_thousands(value: i64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    let len = digits.len();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }

    out
}

/// Block helper: renders the main block if `string(a) == string(b)`, else
/// the inverse (`{{else}}`) block.
fn if_equals_helper(
    h: &Helper,
    registry: &Handlebars,
    ctx: &Context,
    rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let a = display_string(&param_value(h, 0));
    let b = display_string(&param_value(h, 1));

    let template = if a == b { h.template() } else { h.inverse() };

    match template {
        Some(t) => t.render(registry, ctx, rc, out),
        None => Ok(()),
    }
}

fn qr_code_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let data = param_str(h, 0).unwrap_or_default();
    let dark = param_str(h, 1).unwrap_or_else(|| "#000000".to_string());
    let light = param_str(h, 2).unwrap_or_else(|| "transparent".to_string());

    let svg = qr::render_qr_svg(&data, &dark, &light).map_err(|e| {
        RenderErrorReason::Other(format!("qrCode helper failed: {e}"))
    })?;

    out.write(&svg)?;
    Ok(())
}

fn bar_code_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let data = param_str(h, 0).unwrap_or_default();
    let height = h.param(1).and_then(|p| p.value().as_u64()).unwrap_or(60) as u32;
    let show_text = h.param(2).and_then(|p| p.value().as_bool()).unwrap_or(false);
    let dark = param_str(h, 3).unwrap_or_else(|| "#000000".to_string());

    let svg = barcode::render_code128_svg(&data, height, show_text, &dark).map_err(|e| {
        RenderErrorReason::Other(format!("barCode helper failed: {e}"))
    })?;

    out.write(&svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string_null_is_empty() {
        assert_eq!(display_string(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_format_date_tokens() {
        let dt = parse_and_format_date("2026-07-27T10:05:03Z", "yyyy-MM-dd HH:mm:ss").unwrap();
        assert_eq!(dt, "2026-07-27 10:05:03");
    }

    #[test]
    fn test_format_date_default_day_only() {
        let dt = parse_and_format_date("2026-07-27T10:05:03Z", "d").unwrap();
        assert_eq!(dt, "27");
    }

    #[test]
    fn test_format_date_unparseable_is_none() {
        assert!(parse_and_format_date("not-a-date", "yyyy").is_none());
    }

    #[test]
    fn test_currency_en_gb() {
        assert_eq!(format_currency("9.99", "en-GB").unwrap(), "£9.99");
    }

    #[test]
    fn test_currency_unknown_culture_falls_back() {
        assert_eq!(format_currency("9.99", "xx-XX").unwrap(), "£9.99");
    }

    #[test]
    fn test_currency_unparseable_is_none() {
        assert!(format_currency("not-a-number", "en-GB").is_none());
    }

    #[test]
    fn test_currency_thousands_grouping() {
        assert_eq!(format_currency("1234567.5", "en-US").unwrap(), "$1,234,567.50");
    }
}
