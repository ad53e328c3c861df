//! Identifier formatting: `WfGraph` → `wf-graph`.

/// Lowercase every ASCII uppercase letter, prefixing it with `delimiter`
/// unless it is the first character.
pub fn camel_to_separator(camel: &str, delimiter: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for (offset, c) in camel.char_indices() {
        if c.is_ascii_uppercase() {
            if offset > 0 {
                out.push_str(delimiter);
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn camel_to_hyphen(camel: &str) -> String {
    camel_to_separator(camel, "-")
}

pub fn camel_to_underscore(camel: &str) -> String {
    camel_to_separator(camel, "_")
}
