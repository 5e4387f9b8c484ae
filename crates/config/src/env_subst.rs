/// Replace `${VAR}` and `${VAR:-fallback}` placeholders in raw config text.
///
/// Unresolvable variables without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let placeholder = &after[..end];
        let (name, fallback) = match placeholder.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (placeholder, None),
        };

        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => match fallback {
                Some(fallback) if !name.is_empty() => result.push_str(fallback),
                _ => {
                    result.push_str("${");
                    result.push_str(placeholder);
                    result.push('}');
                },
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PLAYBOOK_HOME" => Some("/srv/playbook".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("roots = [\"${PLAYBOOK_HOME}/plugins\"]", lookup),
            "roots = [\"/srv/playbook/plugins\"]"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${PLAYBOOK_MISSING_XYZ}", lookup),
            "${PLAYBOOK_MISSING_XYZ}"
        );
    }

    #[test]
    fn uses_fallback_when_unset() {
        assert_eq!(
            substitute_env_with("level = \"${PLAYBOOK_LEVEL:-warn}\"", lookup),
            "level = \"warn\""
        );
        assert_eq!(
            substitute_env_with("${PLAYBOOK_HOME:-/tmp}", lookup),
            "/srv/playbook"
        );
    }

    #[test]
    fn malformed_placeholders_are_literal() {
        assert_eq!(substitute_env_with("a ${unterminated", lookup), "a ${unterminated");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
