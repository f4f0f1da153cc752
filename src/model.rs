//! Template model (C1) — pure data structures describing a render job.
//!
//! Everything here is plain data: no behaviour beyond conversions and small
//! accessor helpers. [`DocumentTemplate`] is the unit of work the templating
//! engine (C2) and the pipeline (C5) pass around; [`CorrelatedRequest`] and
//! [`CorrelatedResponse`] are the queue-mode wire envelopes (C6).
//!
//! # Wire format
//!
//! All types here round-trip through JSON with camelCase field names
//! (`#[serde(rename_all = "camelCase")]`), matching the queue wire format
//! and the file-mode template format.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dynamic, JSON-shaped value with case-insensitive map lookup.
///
/// The request's `variables` bag arrives through a loosely-typed JSON
/// decoder; before the templating engine sees it, every value is
/// recursively normalised into this tagged variant (see SPEC_FULL.md §9,
/// "Dynamic variable bag").
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// JSON `null`.
    #[default]
    Null,
    /// JSON boolean.
    Bool(bool),
    /// A whole number, preferred over `Float` when the source number has
    /// no fractional part.
    Int(i64),
    /// A number with a fractional part, or one too large for `i64`.
    Float(f64),
    /// A JSON string.
    String(String),
    /// An ordered list of variants.
    List(Vec<Variant>),
    /// A string-keyed mapping, iterated in insertion order, looked up
    /// case-insensitively.
    Map(VariantMap),
}

/// An ordered, case-insensitively-keyed mapping of [`Variant`] values.
///
/// Iteration order matches insertion order (backed by a `Vec` of pairs);
/// lookup normalises the key to lowercase before comparing, so `Name` and
/// `name` refer to the same entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantMap {
    entries: Vec<(String, Variant)>,
}

impl VariantMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert a key/value pair, overwriting any existing entry whose key
    /// compares equal case-insensitively (the original casing of the first
    /// insertion is kept for that slot).
    pub fn insert(&mut self, key: impl Into<String>, value: Variant) {
        let key = key.into();
        let lower = key.to_ascii_lowercase();
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(k, _)| k.to_ascii_lowercase() == lower)
        {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Variant> {
        let lower = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == lower)
            .map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert to a `serde_json::Value` object, for handing to the
    /// templating engine's render context.
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in self.iter() {
            obj.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(obj)
    }
}

impl Variant {
    /// Deep-convert a [`serde_json::Value`] into a [`Variant`], normalising
    /// whole-number floats into [`Variant::Int`] per SPEC_FULL.md §4.1's
    /// deep conversion rule.
    pub fn from_json(value: &serde_json::Value) -> Variant {
        match value {
            serde_json::Value::Null => Variant::Null,
            serde_json::Value::Bool(b) => Variant::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Variant::Int(i)
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Variant::Int(f as i64)
                    } else {
                        Variant::Float(f)
                    }
                } else {
                    Variant::Null
                }
            }
            serde_json::Value::String(s) => Variant::String(s.clone()),
            serde_json::Value::Array(items) => {
                Variant::List(items.iter().map(Variant::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut out = VariantMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), Variant::from_json(v));
                }
                Variant::Map(out)
            }
        }
    }

    /// Render this value the way handlebars would stringify it when
    /// interpolated bare (used by helpers like `ifEquals`/`upper`/`lower`).
    pub fn to_display_string(&self) -> String {
        match self {
            Variant::Null => String::new(),
            Variant::Bool(b) => b.to_string(),
            Variant::Int(i) => i.to_string(),
            Variant::Float(f) => f.to_string(),
            Variant::String(s) => s.clone(),
            Variant::List(items) => items
                .iter()
                .map(Variant::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Variant::Map(_) => String::from("[object Object]"),
        }
    }

    /// Convert back into a [`serde_json::Value`] (used when handing the
    /// variable bag to the handlebars render context).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Variant::Null => serde_json::Value::Null,
            Variant::Bool(b) => serde_json::Value::Bool(*b),
            Variant::Int(i) => serde_json::Value::from(*i),
            Variant::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Variant::String(s) => serde_json::Value::String(s.clone()),
            Variant::List(items) => {
                serde_json::Value::Array(items.iter().map(Variant::to_json).collect())
            }
            Variant::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map.iter() {
                    obj.insert(k.to_string(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
        }
    }
}

/// Ordered variable bag: string keys, deep-converted [`Variant`] values,
/// preserving insertion order and case-insensitive lookup (it is simply a
/// [`VariantMap`] at the top level of a [`DocumentTemplate`]).
pub type VariableBag = VariantMap;

/// Branding fields exposed to every template under `branding.*`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    /// Company name. Required by the model but may be an empty string.
    #[serde(default)]
    pub company_name: String,
    /// Logo URL, if any.
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Primary brand colour (any CSS colour representation).
    #[serde(default)]
    pub primary_colour: Option<String>,
    /// Secondary brand colour.
    #[serde(default)]
    pub secondary_colour: Option<String>,
    /// Heading font family.
    #[serde(default)]
    pub heading_font: Option<String>,
    /// Body font family.
    #[serde(default)]
    pub body_font: Option<String>,
    /// Arbitrary additional string-keyed branding values.
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

/// Template HTML/CSS and named partials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContent {
    /// Inline HTML body (may be empty; never null after resolution).
    #[serde(default)]
    pub html: String,
    /// Optional inline CSS, evaluated against the same context and
    /// injected into the rendered HTML.
    #[serde(default)]
    pub css: Option<String>,
    /// Optional path reference to external HTML. Carried through
    /// unchanged — the core does not resolve it (see SPEC_FULL.md §9).
    #[serde(default)]
    pub html_path: Option<String>,
    /// Optional path reference to external CSS. Carried through
    /// unchanged for the same reason.
    #[serde(default)]
    pub css_path: Option<String>,
    /// Named partial bodies, registered with the engine before rendering
    /// and referenced from the main template via `{{> name}}`.
    #[serde(default)]
    pub partials: BTreeMap<String, String>,
}

/// Recognised paper formats for [`PdfOptions::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperFormat {
    A2,
    A3,
    #[default]
    A4,
    Letter,
    Legal,
    Tabloid,
}

impl PaperFormat {
    /// Parse a format string case-insensitively, falling back to `A4` for
    /// anything unrecognised (per SPEC_FULL.md §6's PDF option mapping).
    pub fn parse(s: &str) -> PaperFormat {
        match s.to_ascii_uppercase().as_str() {
            "A2" => PaperFormat::A2,
            "A3" => PaperFormat::A3,
            "A4" => PaperFormat::A4,
            "LETTER" => PaperFormat::Letter,
            "LEGAL" => PaperFormat::Legal,
            "TABLOID" => PaperFormat::Tabloid,
            _ => PaperFormat::A4,
        }
    }

    /// Paper dimensions in inches (width, height), matching Chrome's
    /// built-in named paper sizes.
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::A2 => (16.54, 23.39),
            PaperFormat::A3 => (11.69, 16.54),
            PaperFormat::A4 => (8.27, 11.69),
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
        }
    }
}

/// Per-side page margins, each an optional CSS-unit string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    #[serde(default)]
    pub top: Option<String>,
    #[serde(default)]
    pub bottom: Option<String>,
    #[serde(default)]
    pub left: Option<String>,
    #[serde(default)]
    pub right: Option<String>,
}

/// Paper/layout settings for the rendered PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    /// One of A2/A3/A4/Letter/Legal/Tabloid, case-insensitive. Defaults to
    /// `"A4"`; ignored when both `width` and `height` are set.
    #[serde(default = "default_format")]
    pub format: String,
    /// CSS-unit width string. When both `width` and `height` are
    /// non-empty they override `format`.
    #[serde(default)]
    pub width: Option<String>,
    /// CSS-unit height string.
    #[serde(default)]
    pub height: Option<String>,
    /// Landscape orientation.
    #[serde(default)]
    pub landscape: bool,
    /// Whether to render CSS backgrounds.
    #[serde(default = "default_true")]
    pub print_background: bool,
    /// Print scale, clamped to `0.1..=2.0` by the renderer.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Per-side margins.
    #[serde(default)]
    pub margins: Option<Margins>,
    /// Header template HTML. Presence of either header or footer enables
    /// header/footer display.
    #[serde(default)]
    pub header_template: Option<String>,
    /// Footer template HTML.
    #[serde(default)]
    pub footer_template: Option<String>,
}

fn default_format() -> String {
    "A4".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

impl Default for PdfOptions {
    fn default() -> Self {
        PdfOptions {
            format: default_format(),
            width: None,
            height: None,
            landscape: false,
            print_background: default_true(),
            scale: default_scale(),
            margins: None,
            header_template: None,
            footer_template: None,
        }
    }
}

impl PdfOptions {
    /// Whether both `width` and `height` are present and non-empty, in
    /// which case they override `format` per SPEC_FULL.md §4.3/§6.
    pub fn has_explicit_size(&self) -> bool {
        matches!((&self.width, &self.height), (Some(w), Some(h)) if !w.is_empty() && !h.is_empty())
    }

    /// Whether either header or footer template is present, enabling
    /// header/footer display per SPEC_FULL.md §6.
    pub fn has_header_or_footer(&self) -> bool {
        self.header_template.is_some() || self.footer_template.is_some()
    }

    /// Scale clamped into the documented `0.1..=2.0` range.
    pub fn clamped_scale(&self) -> f64 {
        self.scale.clamp(0.1, 2.0)
    }
}

/// A complete, self-contained document template: the unit of work the
/// engine and pipeline operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    /// Short string tag identifying the kind of document (used in output
    /// filenames).
    pub document_type: String,
    /// A free-form version tag for the template body.
    #[serde(default)]
    pub version: String,
    /// Branding fields.
    #[serde(default)]
    pub branding: Branding,
    /// Template HTML/CSS/partials.
    pub template: TemplateContent,
    /// Ordered, dynamically-typed variable bag.
    #[serde(default, with = "variable_bag_json")]
    pub variables: VariableBag,
    /// Paper/layout settings.
    #[serde(default)]
    pub pdf: PdfOptions,
}

/// `serde` bridge between a JSON object and [`VariableBag`]/[`VariantMap`],
/// since `Variant` is not itself `Serialize`/`Deserialize` (its shape is
/// produced purely by [`Variant::from_json`]'s deep-conversion rule).
mod variable_bag_json {
    use super::{Variant, VariantMap};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(map: &VariantMap, s: S) -> Result<S::Ok, S::Error> {
        let mut obj = serde_json::Map::new();
        for (k, v) in map.iter() {
            obj.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(obj).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<VariantMap, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        match Variant::from_json(&value) {
            Variant::Map(map) => Ok(map),
            Variant::Null => Ok(VariantMap::new()),
            _ => Ok(VariantMap::new()),
        }
    }
}

/// A render job as it flows into the pipeline: a template plus a job
/// identifier and creation timestamp.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Unique job identifier. In queue mode this is the envelope's
    /// `correlationId`.
    pub job_id: String,
    /// The template to render.
    pub template: DocumentTemplate,
    /// When this request was created.
    pub created_at: DateTime<Utc>,
}

impl RenderRequest {
    /// Build a request, generating a fresh UUID `job_id` when none is
    /// supplied.
    pub fn new(job_id: Option<String>, template: DocumentTemplate) -> Self {
        RenderRequest {
            job_id: job_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            template,
            created_at: Utc::now(),
        }
    }
}

/// The outcome of a successful pipeline execution. Values are write-once:
/// construct with [`RenderResult::new`] and treat as immutable thereafter.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub job_id: String,
    pub document_type: String,
    pub pdf_bytes: Vec<u8>,
    pub elapsed: Duration,
}

impl RenderResult {
    /// Construct a result. There is no setter API by design — once built,
    /// every field is final.
    pub fn new(job_id: String, document_type: String, pdf_bytes: Vec<u8>, elapsed: Duration) -> Self {
        RenderResult {
            job_id,
            document_type,
            pdf_bytes,
            elapsed,
        }
    }
}

/// Queue-mode inbound envelope: a template plus routing/correlation
/// metadata supplied by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelatedRequest {
    /// Correlation id used to match the response to this request and to
    /// key transport partitioning.
    pub correlation_id: String,
    /// Identifier of the requesting device.
    pub device_id: String,
    /// Optional session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
    /// The template to render.
    pub template: DocumentTemplate,
    /// Whether the PDF should be returned inline (base64) rather than
    /// written to disk with a path reference.
    #[serde(default = "default_true")]
    pub return_pdf_inline: bool,
    /// When the transport received this envelope.
    pub requested_at: DateTime<Utc>,
}

/// Queue-mode outbound envelope, echoing request identity per
/// SPEC_FULL.md §8's "Envelope echo" property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelatedResponse {
    pub correlation_id: String,
    pub device_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub document_type: String,
    pub success: bool,
    /// Base64-encoded PDF bytes, present only when `success` and the
    /// request asked for inline delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    /// Absolute path to the written PDF, present only when `success` and
    /// the request asked for on-disk delivery. Mutually exclusive with
    /// `pdf_base64`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    /// Human-readable failure reason, present only when `!success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CorrelatedResponse {
    /// Build a success reply carrying inline base64 PDF bytes.
    pub fn success_inline(
        request: &CorrelatedRequest,
        document_type: String,
        pdf_base64: String,
        elapsed: Duration,
    ) -> Self {
        CorrelatedResponse {
            correlation_id: request.correlation_id.clone(),
            device_id: request.device_id.clone(),
            session_id: request.session_id.clone(),
            document_type,
            success: true,
            pdf_base64: Some(pdf_base64),
            pdf_path: None,
            error_message: None,
            elapsed_ms: elapsed.as_millis() as u64,
            completed_at: Utc::now(),
        }
    }

    /// Build a success reply carrying an on-disk path.
    pub fn success_path(
        request: &CorrelatedRequest,
        document_type: String,
        pdf_path: String,
        elapsed: Duration,
    ) -> Self {
        CorrelatedResponse {
            correlation_id: request.correlation_id.clone(),
            device_id: request.device_id.clone(),
            session_id: request.session_id.clone(),
            document_type,
            success: true,
            pdf_base64: None,
            pdf_path: Some(pdf_path),
            error_message: None,
            elapsed_ms: elapsed.as_millis() as u64,
            completed_at: Utc::now(),
        }
    }

    /// Build a failure reply.
    pub fn failure(request: &CorrelatedRequest, error_message: String, elapsed: Duration) -> Self {
        CorrelatedResponse {
            correlation_id: request.correlation_id.clone(),
            device_id: request.device_id.clone(),
            session_id: request.session_id.clone(),
            document_type: request.template.document_type.clone(),
            success: false,
            pdf_base64: None,
            pdf_path: None,
            error_message: Some(error_message),
            elapsed_ms: elapsed.as_millis() as u64,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_map_case_insensitive_lookup() {
        let mut map = VariantMap::new();
        map.insert("Name", Variant::String("Alice".into()));
        assert_eq!(
            map.get("name"),
            Some(&Variant::String("Alice".into()))
        );
        assert_eq!(
            map.get("NAME"),
            Some(&Variant::String("Alice".into()))
        );
    }

    #[test]
    fn test_variant_map_preserves_insertion_order() {
        let mut map = VariantMap::new();
        map.insert("b", Variant::Int(2));
        map.insert("a", Variant::Int(1));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_variant_from_json_whole_number_becomes_int() {
        let value = serde_json::json!(42.0);
        assert_eq!(Variant::from_json(&value), Variant::Int(42));
    }

    #[test]
    fn test_variant_from_json_fractional_number_becomes_float() {
        let value = serde_json::json!(9.99);
        assert_eq!(Variant::from_json(&value), Variant::Float(9.99));
    }

    #[test]
    fn test_variant_from_json_nested_object() {
        let value = serde_json::json!({"name": "Alice", "age": 30});
        match Variant::from_json(&value) {
            Variant::Map(map) => {
                assert_eq!(map.get("name"), Some(&Variant::String("Alice".into())));
                assert_eq!(map.get("age"), Some(&Variant::Int(30)));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_paper_format_parse_case_insensitive() {
        assert_eq!(PaperFormat::parse("a4"), PaperFormat::A4);
        assert_eq!(PaperFormat::parse("LETTER"), PaperFormat::Letter);
        assert_eq!(PaperFormat::parse("bogus"), PaperFormat::A4);
    }

    #[test]
    fn test_pdf_options_defaults() {
        let options = PdfOptions::default();
        assert_eq!(options.format, "A4");
        assert!(options.print_background);
        assert_eq!(options.scale, 1.0);
        assert!(!options.has_explicit_size());
        assert!(!options.has_header_or_footer());
    }

    #[test]
    fn test_pdf_options_explicit_size() {
        let mut options = PdfOptions::default();
        options.width = Some("200px".into());
        options.height = Some("300px".into());
        assert!(options.has_explicit_size());
    }

    #[test]
    fn test_scale_clamped() {
        let mut options = PdfOptions::default();
        options.scale = 5.0;
        assert_eq!(options.clamped_scale(), 2.0);
        options.scale = 0.01;
        assert_eq!(options.clamped_scale(), 0.1);
    }

    #[test]
    fn test_render_request_generates_job_id_when_absent() {
        let template = sample_template();
        let request = RenderRequest::new(None, template);
        assert!(!request.job_id.is_empty());
    }

    #[test]
    fn test_render_request_keeps_supplied_job_id() {
        let template = sample_template();
        let request = RenderRequest::new(Some("job-1".into()), template);
        assert_eq!(request.job_id, "job-1");
    }

    #[test]
    fn test_correlated_response_success_inline_excludes_path() {
        let request = sample_correlated_request();
        let response = CorrelatedResponse::success_inline(
            &request,
            "invoice".into(),
            "JVBERg==".into(),
            Duration::from_millis(12),
        );
        assert!(response.success);
        assert_eq!(response.pdf_base64.as_deref(), Some("JVBERg=="));
        assert!(response.pdf_path.is_none());
        assert_eq!(response.correlation_id, request.correlation_id);
    }

    #[test]
    fn test_correlated_response_failure_carries_message() {
        let request = sample_correlated_request();
        let response =
            CorrelatedResponse::failure(&request, "render failed".into(), Duration::from_millis(1));
        assert!(!response.success);
        assert_eq!(response.error_message.as_deref(), Some("render failed"));
        assert!(response.pdf_base64.is_none());
        assert!(response.pdf_path.is_none());
    }

    fn sample_template() -> DocumentTemplate {
        DocumentTemplate {
            document_type: "invoice".into(),
            version: "1".into(),
            branding: Branding::default(),
            template: TemplateContent {
                html: "<p>hi</p>".into(),
                ..Default::default()
            },
            variables: VariantMap::new(),
            pdf: PdfOptions::default(),
        }
    }

    fn sample_correlated_request() -> CorrelatedRequest {
        CorrelatedRequest {
            correlation_id: "corr-1".into(),
            device_id: "device-1".into(),
            session_id: None,
            template: sample_template(),
            return_pdf_inline: true,
            requested_at: Utc::now(),
        }
    }
}
