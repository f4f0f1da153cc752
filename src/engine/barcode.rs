//! Code 128 (Code Set B) barcode SVG emission for the `barCode` helper.
//!
//! No published Code 128 crate appears anywhere in the retrieved example
//! pack, so this encodes the bar/space pattern table directly. Code Set B
//! covers ASCII 32-127, which is sufficient for the alphanumeric payloads
//! document templates pass through this helper.

/// Each entry is the bar/space widths (in modules) for one Code Set B
/// symbol, values 0-102 map to ASCII 32-126 plus two punctuation values,
/// in the order: bar, space, bar, space, bar, space (always 6 widths,
/// summing to 11 modules).
const PATTERNS: [[u8; 6]; 107] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2], [2, 3, 3, 1, 1, 1],
];

/// Stop pattern (7 widths, summing to 13 modules).
const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const START_B: usize = 104;
const STOP: usize = 106;

/// Render `data` as an inline Code 128 (Set B) SVG barcode.
///
/// # Errors
///
/// Returns an error string if `data` contains a byte outside the
/// printable ASCII range Code Set B can encode (32-126).
pub(super) fn render_code128_svg(
    data: &str,
    height: u32,
    show_text: bool,
    dark: &str,
) -> Result<String, String> {
    let mut values = Vec::with_capacity(data.len() + 3);
    values.push(START_B);

    for byte in data.bytes() {
        if !(32..=126).contains(&byte) {
            return Err(format!("byte {byte:#x} is outside Code Set B's printable range"));
        }
        values.push((byte - 32) as usize);
    }

    let checksum = compute_checksum(&values);
    values.push(checksum);
    values.push(STOP);

    let mut bars = Vec::new();
    for &value in &values[..values.len() - 1] {
        bars.extend_from_slice(&PATTERNS[value]);
    }
    bars.extend_from_slice(&STOP_PATTERN);

    Ok(emit_svg(&bars, height, show_text, dark, data))
}

/// `(start + sum(value_i * position_i)) mod 103`, positions starting at 1.
fn compute_checksum(values: &[usize]) -> usize {
    let start = values[0];
    let weighted: usize = values[1..]
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i + 1))
        .sum();
    (start + weighted) % 103
}

const MODULE_WIDTH: u32 = 2;
const TEXT_HEIGHT: u32 = 16;

fn emit_svg(bars: &[u8], height: u32, show_text: bool, dark: &str, text: &str) -> String {
    let total_modules: u32 = bars.iter().map(|&w| w as u32).sum();
    let width_px = total_modules * MODULE_WIDTH;
    let text_space = if show_text { TEXT_HEIGHT } else { 0 };
    let total_height = height + text_space;

    let mut svg = String::with_capacity(bars.len() as usize * 40 + 128);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width_px} {total_height}\" width=\"{width_px}\" height=\"{total_height}\">"
    ));

    let mut x = 0u32;
    for (i, &width) in bars.iter().enumerate() {
        let w_px = width as u32 * MODULE_WIDTH;
        if i % 2 == 0 {
            svg.push_str(&format!(
                "<rect x=\"{x}\" y=\"0\" width=\"{w_px}\" height=\"{height}\" fill=\"{dark}\"/>"
            ));
        }
        x += w_px;
    }

    if show_text {
        let escaped = text
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\" fill=\"{dark}\">{escaped}</text>",
            width_px / 2,
            height + TEXT_HEIGHT - 4,
        ));
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_code128_svg_produces_svg_root() {
        let svg = render_code128_svg("ABC123", 60, false, "#000000").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_show_text_appends_text_element() {
        let svg = render_code128_svg("ABC", 40, true, "#000000").unwrap();
        assert!(svg.contains("<text"));
        assert!(svg.contains(">ABC<"));
    }

    #[test]
    fn test_hide_text_omits_text_element() {
        let svg = render_code128_svg("ABC", 40, false, "#000000").unwrap();
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn test_non_ascii_byte_is_rejected() {
        let result = render_code128_svg("café", 40, false, "#000000");
        assert!(result.is_err());
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let svg_a = render_code128_svg("HELLO", 40, false, "#000000").unwrap();
        let svg_b = render_code128_svg("HELLO", 40, false, "#000000").unwrap();
        assert_eq!(svg_a, svg_b);
    }
}
