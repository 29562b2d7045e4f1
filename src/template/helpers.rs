// ABOUTME: Handlebars helper functions for job template rendering
// ABOUTME: Implements property lookup (p, if_p, unless_p) plus string and JSON formatting helpers

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    Renderable, ScopedJson,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::context::resolve_property;
use super::error::PropertyLookupError;

/// Sections of the render data searched by property helpers, in priority order
const PROPERTY_SOURCES: [&str; 2] = ["job_properties", "default_properties"];

/// Resolve a property path against render data shaped like a `RenderContext`
pub fn lookup_property(root: &JsonValue, path: &str) -> Option<JsonValue> {
    let empty = JsonMap::new();
    let [job, defaults] = PROPERTY_SOURCES.map(|source| {
        root.get(source)
            .and_then(JsonValue::as_object)
            .unwrap_or(&empty)
    });
    resolve_property(job, defaults, path)
}

/// String form of a property value as it appears in rendered output.
///
/// Objects and arrays render as compact JSON; `null` renders empty.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

fn lookup_error(helper: &str, error: PropertyLookupError) -> RenderError {
    RenderError::from_error(helper, error)
}

fn property_name_at(h: &Helper, index: usize) -> Result<String, RenderError> {
    let param = h.param(index).ok_or_else(|| {
        lookup_error(
            h.name(),
            PropertyLookupError::Malformed(format!("{} helper requires a property name", h.name())),
        )
    })?;

    let name = param.value().as_str().ok_or_else(|| {
        lookup_error(
            h.name(),
            PropertyLookupError::Malformed(format!(
                "{} helper expects a quoted property name, got {}",
                h.name(),
                param.value()
            )),
        )
    })?;

    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(lookup_error(
            h.name(),
            PropertyLookupError::Malformed(format!("invalid property name '{}'", name)),
        ));
    }

    Ok(name.to_string())
}

/// `p "name" [fallback]`: job property, then default, then the literal fallback
pub struct PropertyHelper;

impl PropertyHelper {
    fn resolve(&self, h: &Helper, ctx: &Context) -> Result<JsonValue, RenderError> {
        let name = property_name_at(h, 0)?;

        if let Some(value) = lookup_property(ctx.data(), &name) {
            return Ok(value);
        }

        match h.param(1) {
            Some(fallback) => Ok(fallback.value().clone()),
            None => Err(lookup_error(h.name(), PropertyLookupError::Unresolved(name))),
        }
    }
}

impl HelperDef for PropertyHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        self.resolve(h, ctx).map(ScopedJson::Derived)
    }

    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = self.resolve(h, ctx)?;
        out.write(&stringify(&value))?;
        Ok(())
    }
}

/// `#if_p "a" "b"`: renders the block when every named property is set and truthy.
/// `#unless_p` is the inverse. Absent properties count as falsy.
pub struct IfPropertyHelper {
    negate: bool,
}

impl HelperDef for IfPropertyHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let count = h.params().len().max(1);
        let mut all_set = true;
        for index in 0..count {
            let name = property_name_at(h, index)?;
            let truthy = lookup_property(ctx.data(), &name)
                .map(|value| is_truthy(&value))
                .unwrap_or(false);
            all_set &= truthy;
        }

        let template = if all_set != self.negate {
            h.template()
        } else {
            h.inverse()
        };

        match template {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

/// JSON helper - renders any value as compact JSON
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let value = h
        .param(0)
        .map(|v| v.value())
        .ok_or_else(|| RenderError::new("json helper requires a value parameter"))?;

    out.write(&value.to_string())?;
    Ok(())
}

/// Base64 encode helper
pub fn base64_encode_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let input = h
        .param(0)
        .map(|v| stringify(v.value()))
        .ok_or_else(|| RenderError::new("base64_encode helper requires input parameter"))?;

    out.write(&BASE64.encode(input.as_bytes()))?;
    Ok(())
}

/// Base64 decode helper
pub fn base64_decode_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let input = h
        .param(0)
        .and_then(|v| v.value().as_str())
        .ok_or_else(|| RenderError::new("base64_decode helper requires input parameter"))?;

    let decoded_bytes = BASE64
        .decode(input)
        .map_err(|e| RenderError::new(format!("Base64 decode error: {}", e)))?;

    let decoded_str = String::from_utf8(decoded_bytes)
        .map_err(|e| RenderError::new(format!("UTF-8 decode error: {}", e)))?;

    out.write(&decoded_str)?;
    Ok(())
}

/// Uppercase helper
pub fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let input = h
        .param(0)
        .map(|v| stringify(v.value()))
        .ok_or_else(|| RenderError::new("upper helper requires input parameter"))?;

    out.write(&input.to_uppercase())?;
    Ok(())
}

/// Lowercase helper
pub fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let input = h
        .param(0)
        .map(|v| stringify(v.value()))
        .ok_or_else(|| RenderError::new("lower helper requires input parameter"))?;

    out.write(&input.to_lowercase())?;
    Ok(())
}

/// Join helper - `join ", " list` joins array elements with a separator
pub fn join_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let separator = h.param(0).and_then(|v| v.value().as_str()).unwrap_or(",");

    let array = h
        .param(1)
        .and_then(|v| v.value().as_array())
        .ok_or_else(|| RenderError::new("join helper requires array parameter"))?;

    let joined = array.iter().map(stringify).collect::<Vec<_>>().join(separator);
    out.write(&joined)?;
    Ok(())
}

/// Default helper - provides default value if the first value is empty
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let value = h.param(0).map(|v| stringify(v.value())).unwrap_or_default();

    let default_value = h
        .param(1)
        .map(|v| stringify(v.value()))
        .ok_or_else(|| RenderError::new("default helper requires default value parameter"))?;

    let result = if value.is_empty() {
        default_value
    } else {
        value
    };

    out.write(&result)?;
    Ok(())
}

/// Register all built-in helpers with a Handlebars instance
pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("p", Box::new(PropertyHelper));
    handlebars.register_helper("if_p", Box::new(IfPropertyHelper { negate: false }));
    handlebars.register_helper("unless_p", Box::new(IfPropertyHelper { negate: true }));
    handlebars.register_helper("json", Box::new(json_helper));
    handlebars.register_helper("base64_encode", Box::new(base64_encode_helper));
    handlebars.register_helper("base64_decode", Box::new(base64_decode_helper));
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("join", Box::new(join_helper));
    handlebars.register_helper("default", Box::new(default_helper));
}
