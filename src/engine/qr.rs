//! QR code SVG emission for the `qrCode` helper.
//!
//! Uses the `qrcode` crate for matrix generation (error-correction level M)
//! and hand-rolls SVG output so the `light="transparent"` quirk can be
//! applied: when the caller asks for a transparent background, any
//! white-background rect emitted by the renderer is rewritten to
//! `fill="none"`.

use qrcode::{EcLevel, QrCode};

const MODULE_PIXELS: u32 = 10;

/// Render `data` as an inline SVG QR code.
///
/// # Errors
///
/// Returns an error string if the QR matrix can't be constructed (e.g. the
/// payload is too large for any supported version).
pub(super) fn render_qr_svg(data: &str, dark: &str, light: &str) -> Result<String, String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| e.to_string())?;

    let width = code.width();
    let size_px = width as u32 * MODULE_PIXELS;
    let transparent = light.eq_ignore_ascii_case("transparent");
    let background = if transparent { "#ffffff" } else { light };

    let mut svg = String::with_capacity(size_px as usize * 8);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {size_px} {size_px}\" width=\"{size_px}\" height=\"{size_px}\">"
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{background}\"/>"
    ));

    let colors = code.to_colors();
    for y in 0..width {
        for x in 0..width {
            if colors[y * width + x] == qrcode::Color::Dark {
                let px = x as u32 * MODULE_PIXELS;
                let py = y as u32 * MODULE_PIXELS;
                svg.push_str(&format!(
                    "<rect x=\"{px}\" y=\"{py}\" width=\"{MODULE_PIXELS}\" height=\"{MODULE_PIXELS}\" fill=\"{dark}\"/>"
                ));
            }
        }
    }

    svg.push_str("</svg>");

    if transparent {
        svg = svg.replace("fill=\"#ffffff\"", "fill=\"none\"");
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_qr_svg_produces_svg_root() {
        let svg = render_qr_svg("hello", "#000000", "#ffffff").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_transparent_light_rewrites_background_fill() {
        let svg = render_qr_svg("hello", "#000000", "transparent").unwrap();
        assert!(svg.contains("fill=\"none\""));
        assert!(!svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_custom_dark_color_applied() {
        let svg = render_qr_svg("x", "#ff00ff", "#ffffff").unwrap();
        assert!(svg.contains("fill=\"#ff00ff\""));
    }
}
