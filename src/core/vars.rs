use std::collections::HashMap;

/// Substitute `{NAME}` and `${NAME}` placeholders from `vars`.
///
/// Substitution is all-or-nothing: if any placeholder names an unknown
/// variable the template is returned unchanged.
pub fn replace_vars(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + close];
        let Some(value) = vars.get(name) else {
            return template.to_string();
        };

        let head = &rest[..open];
        out.push_str(head.strip_suffix('$').unwrap_or(head));
        out.push_str(value);
        rest = &rest[open + 1 + close + 1..];
    }

    out.push_str(rest);
    out
}
