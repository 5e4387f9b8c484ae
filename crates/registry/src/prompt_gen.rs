use crate::registry::{QUALIFIER, Registry};

/// Render the model-invoked skills as an `<available_skills>` block.
///
/// Returns an empty string when the registry holds no skills so callers can
/// append unconditionally.
pub fn generate_skills_prompt(registry: &Registry) -> String {
    let mut out = String::new();
    for (collection, doc) in registry.skills() {
        if out.is_empty() {
            out.push_str("<available_skills>\n");
        }
        out.push_str(&format!(
            "<skill name=\"{}{QUALIFIER}{}\" collection=\"{}\">\n<description>{}</description>\n</skill>\n",
            escape_xml(&collection.name),
            escape_xml(&doc.name),
            escape_xml(&collection.name),
            escape_xml(&doc.description),
        ));
    }
    if !out.is_empty() {
        out.push_str("</available_skills>\n");
    }
    out
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
