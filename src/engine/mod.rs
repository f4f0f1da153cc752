//! Templating engine (C2) — expands a document template into HTML.
//!
//! This module provides [`TemplateEngine`], a thin wrapper around a
//! per-render `handlebars::Handlebars` instance. A fresh instance is built
//! for every render so that per-request partial registration never leaks
//! across concurrent renders (SPEC_FULL.md §5, "Engine global registration").
//!
//! # Overview
//!
//! - Deep-converts the request's variable bag into the render context
//! - Registers per-request partials
//! - Renders the HTML body, then (if present) the CSS, injecting the result
//! - Applies the triple-brace quirk fix to CSS before compiling it
//!
//! # Example
//!
//! ```rust,ignore
//! use docrender_core::{TemplateEngine, CancelSignal};
//!
//! let html = TemplateEngine::render(&template, &CancelSignal::none())?;
//! ```

mod helpers;
mod barcode;
mod qr;

use handlebars::Handlebars;

use crate::cancel::CancelSignal;
use crate::error::{RenderError, Result};
use crate::model::DocumentTemplate;

/// Stateless entry point for template rendering.
///
/// Holds no state itself; every call to [`render`](Self::render) builds its
/// own `Handlebars` instance so partials registered for one render can never
/// be observed by another running concurrently.
pub struct TemplateEngine;

impl TemplateEngine {
    /// Render a document template into a complete HTML document string.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Cancelled`] if `cancel` is already triggered at entry.
    /// - [`RenderError::TemplateParse`] if the HTML or CSS body fails to
    ///   compile.
    /// - [`RenderError::TemplateEval`] if compilation succeeds but
    ///   evaluation fails (e.g. a helper call errors).
    pub fn render(template: &DocumentTemplate, cancel: &CancelSignal) -> Result<String> {
        if cancel.is_cancelled() {
            log::debug!(" Engine render cancelled before starting");
            return Err(RenderError::Cancelled);
        }

        log::debug!(
            " Rendering template (documentType={}, version={})",
            template.document_type,
            template.version
        );

        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        helpers::register_helpers(&mut registry);

        for (name, body) in &template.template.partials {
            registry
                .register_partial(name, body)
                .map_err(|e| RenderError::TemplateParse(format!("partial '{name}': {e}")))?;
        }

        let context = build_context(template);

        let mut html = registry
            .render_template(&template.template.html, &context)
            .map_err(|e| RenderError::TemplateEval(e.to_string()))?;

        if let Some(css) = template.template.css.as_deref() {
            if !css.is_empty() {
                let fixed_css = fix_triple_brace(css);
                let rendered_css = registry
                    .render_template(&fixed_css, &context)
                    .map_err(|e| RenderError::TemplateEval(e.to_string()))?;
                html = inject_css(&html, &rendered_css);
            }
        }

        log::trace!("✅ Template rendered, {} bytes of HTML produced", html.len());
        Ok(html)
    }
}

/// Build the render context: `branding`, `variables`, `meta`.
fn build_context(template: &DocumentTemplate) -> serde_json::Value {
    let branding = serde_json::to_value(&template.branding).unwrap_or(serde_json::Value::Null);
    let variables = template.variables.to_json_value();
    let meta = serde_json::json!({
        "documentType": template.document_type,
        "version": template.version,
        "generatedAt": chrono::Utc::now().to_rfc3339(),
    });

    serde_json::json!({
        "branding": branding,
        "variables": variables,
        "meta": meta,
    })
}

/// Rewrite every `}}}` sequence in CSS to `}} }` so the mustache parser
/// doesn't mistake adjacent closing braces for a delimiter (SPEC_FULL.md
/// §4.1, "Triple-brace quirk"). Applied only to CSS; HTML is unchanged.
fn fix_triple_brace(css: &str) -> String {
    css.replace("}}}", "}} }")
}

/// Inject a `<style>` block: before `</head>` (case-insensitive) if found,
/// otherwise prepended to the document.
fn inject_css(html: &str, css: &str) -> String {
    let style_block = format!("<style>{css}</style>");

    if let Some(pos) = find_case_insensitive(html, "</head>") {
        let mut out = String::with_capacity(html.len() + style_block.len());
        out.push_str(&html[..pos]);
        out.push_str(&style_block);
        out.push_str(&html[pos..]);
        out
    } else {
        format!("{style_block}{html}")
    }
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let haystack_lower = haystack.to_ascii_lowercase();
    let needle_lower = needle.to_ascii_lowercase();
    haystack_lower.find(&needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branding, DocumentTemplate, PdfOptions, TemplateContent, VariantMap};

    fn template_with(html: &str, css: Option<&str>) -> DocumentTemplate {
        DocumentTemplate {
            document_type: "invoice".into(),
            version: "1".into(),
            branding: Branding::default(),
            template: TemplateContent {
                html: html.to_string(),
                css: css.map(|s| s.to_string()),
                ..Default::default()
            },
            variables: VariantMap::new(),
            pdf: PdfOptions::default(),
        }
    }

    #[test]
    fn test_variable_substitution() {
        let mut template = template_with("<p>{{variables.name}}</p>", None);
        template.variables.insert("name", crate::model::Variant::String("Alice".into()));
        let html = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert_eq!(html, "<p>Alice</p>");
    }

    #[test]
    fn test_css_injection_with_head() {
        let template = template_with(
            "<html><head></head><body>x</body></html>",
            Some("p{color:red}"),
        );
        let html = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert!(html.contains("<style>p{color:red}</style></head>"));
    }

    #[test]
    fn test_css_injection_without_head() {
        let template = template_with("<body>x</body>", Some("p{m:0}"));
        let html = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert!(html.starts_with("<style>p{m:0}</style>"));
    }

    #[test]
    fn test_triple_brace_css_does_not_raise() {
        let template = template_with("<body>x</body>", Some("a{}}"));
        let result = TemplateEngine::render(&template, &CancelSignal::none());
        assert!(result.is_ok());
    }

    #[test]
    fn test_idempotent_inlining_when_css_absent() {
        let html_in = "<html><head><style>p{color:blue}</style></head><body>x</body></html>";
        let template = template_with(html_in, None);
        let html_out = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert_eq!(html_out, html_in);
    }

    #[test]
    fn test_cancelled_before_entry_fails_fast() {
        let template = template_with("<p>x</p>", None);
        let cancel = CancelSignal::new();
        cancel.cancel();
        let result = TemplateEngine::render(&template, &cancel);
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn test_missing_binding_resolves_to_empty() {
        let template = template_with("<p>{{variables.missing}}</p>", None);
        let html = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert_eq!(html, "<p></p>");
    }

    #[test]
    fn test_partial_registration() {
        let mut template = template_with("<div>{{> greeting}}</div>", None);
        template.template.partials.insert("greeting".into(), "hello".into());
        let html = TemplateEngine::render(&template, &CancelSignal::none()).unwrap();
        assert_eq!(html, "<div>hello</div>");
    }
}
