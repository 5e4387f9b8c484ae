use std::path::Path;

use {
    serde::{Deserialize, de::DeserializeOwned},
    serde_yaml::{Mapping, Value},
};

use crate::{
    error::{Error, Result},
    registry::QUALIFIER,
    types::{Document, InvocationMode},
};

/// Longest description derived from a command body.
const MAX_DERIVED_DESCRIPTION: usize = 120;

/// Validate a skill name: lowercase ASCII, digits, hyphens, 1-64 chars.
///
/// Colons are rejected since `collection:name` is the qualified form.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// A parsed document plus header problems that did not exclude it.
#[derive(Debug)]
pub struct Parsed {
    pub document: Document,
    pub warnings: Vec<String>,
}

/// Fields recognised in a document's YAML header. Unknown keys are ignored.
#[derive(Debug, Default)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    argument_hint: Option<String>,
    allowed_tools: Vec<String>,
    license: Option<String>,
}

impl Frontmatter {
    /// Read the known keys. A field with the wrong shape is dropped and
    /// reported in `warnings`; only a header that is not a YAML mapping fails.
    fn from_yaml(yaml: &str, warnings: &mut Vec<String>) -> std::result::Result<Self, String> {
        if yaml.is_empty() {
            return Ok(Self::default());
        }
        let map = match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(map)) => map,
            Ok(Value::Null) => return Ok(Self::default()),
            Ok(_) => return Err("frontmatter must be a YAML mapping".to_string()),
            Err(e) => return Err(format!("invalid frontmatter: {e}")),
        };

        Ok(Self {
            name: field(&map, &["name"], warnings),
            description: field(&map, &["description"], warnings),
            argument_hint: field::<ArgumentHint>(
                &map,
                &["argument-hint", "argument_hint"],
                warnings,
            )
            .map(ArgumentHint::into_string),
            allowed_tools: field::<ToolList>(&map, &["allowed-tools", "allowed_tools"], warnings)
                .map(ToolList::into_vec)
                .unwrap_or_default(),
            license: field(&map, &["license"], warnings),
        })
    }
}

/// Deserialize the first present key of `keys`, or report and drop it.
fn field<T: DeserializeOwned>(
    map: &Mapping,
    keys: &[&str],
    warnings: &mut Vec<String>,
) -> Option<T> {
    let (key, value) = keys.iter().find_map(|k| map.get(*k).map(|v| (*k, v)))?;
    if value.is_null() {
        return None;
    }
    match serde_yaml::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warnings.push(format!("ignoring `{key}`: {e}"));
            None
        },
    }
}

/// `argument-hint: [message]` is a YAML sequence, not a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArgumentHint {
    Inline(String),
    Words(Vec<String>),
}

impl ArgumentHint {
    fn into_string(self) -> String {
        match self {
            Self::Inline(s) => s,
            Self::Words(words) => words.join(" "),
        }
    }
}

/// `allowed-tools` appears both as a YAML list and as a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolList {
    List(Vec<String>),
    Inline(String),
}

impl ToolList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(v) => v,
            Self::Inline(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Parse a `SKILL.md` into a model-invoked document.
///
/// Skills must carry frontmatter with a valid `name` and a non-empty
/// `description`; anything else is a [`Error::MalformedDocument`].
pub fn parse_skill(content: &str, path: &Path) -> Result<Parsed> {
    let (yaml, body) = split_frontmatter(content)
        .map_err(|reason| Error::malformed(path, reason))?
        .ok_or_else(|| Error::malformed(path, "skill must start with YAML frontmatter"))?;
    let mut warnings = Vec::new();
    let fm = Frontmatter::from_yaml(yaml, &mut warnings)
        .map_err(|reason| Error::malformed(path, reason))?;

    let name = non_empty(fm.name).ok_or_else(|| Error::malformed(path, "missing `name`"))?;
    if !validate_name(&name) {
        return Err(Error::malformed(
            path,
            format!("invalid skill name '{name}': must be 1-64 lowercase alphanumeric/hyphen chars"),
        ));
    }
    let description =
        non_empty(fm.description).ok_or_else(|| Error::malformed(path, "missing `description`"))?;

    Ok(Parsed {
        document: Document {
            name,
            description,
            invocation_mode: InvocationMode::ModelInvokedSkill,
            body: body.to_string(),
            path: path.to_path_buf(),
            argument_hint: fm.argument_hint,
            allowed_tools: fm.allowed_tools,
            license: fm.license,
        },
        warnings,
    })
}

/// Parse an explicit command. The name is the file stem; frontmatter is optional.
///
/// A header that cannot be read is ignored with a warning, so the command
/// stays addressable by its file name.
pub fn parse_command(content: &str, path: &Path) -> Result<Parsed> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::malformed(path, "command file has no usable name"))?
        .to_string();
    if name.contains(QUALIFIER) {
        return Err(Error::malformed(
            path,
            format!("command name '{name}' contains '{QUALIFIER}'"),
        ));
    }

    let mut warnings = Vec::new();
    let (fm, body) = match split_frontmatter(content) {
        Ok(Some((yaml, body))) => match Frontmatter::from_yaml(yaml, &mut warnings) {
            Ok(fm) => (fm, body),
            Err(reason) => {
                warnings.push(format!("{reason}; header ignored"));
                (Frontmatter::default(), body)
            },
        },
        Ok(None) => (Frontmatter::default(), content.trim()),
        Err(reason) => {
            warnings.push(format!("{reason}; header ignored"));
            (Frontmatter::default(), content.trim())
        },
    };

    let description =
        non_empty(fm.description).unwrap_or_else(|| derive_description(body));

    Ok(Parsed {
        document: Document {
            name,
            description,
            invocation_mode: InvocationMode::ExplicitCommand,
            body: body.to_string(),
            path: path.to_path_buf(),
            argument_hint: fm.argument_hint,
            allowed_tools: fm.allowed_tools,
            license: fm.license,
        },
        warnings,
    })
}

/// First non-empty, non-heading line of the body, truncated.
pub fn derive_description(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or("")
        .chars()
        .take(MAX_DERIVED_DESCRIPTION)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split content at `---` delimiters into `(frontmatter, body)`.
///
/// Returns `Ok(None)` when the content has no frontmatter at all. The closing
/// delimiter must be a line of its own.
fn split_frontmatter(content: &str) -> std::result::Result<Option<(&str, &str)>, &'static str> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed.strip_prefix("---") else {
        return Ok(None);
    };
    // `---` followed by more dashes or text is a markdown rule, not a header.
    if !after_open.starts_with('\n') && !after_open.starts_with("\r\n") {
        return Ok(None);
    }

    let close_pos = after_open
        .match_indices("\n---")
        .map(|(i, _)| i)
        .find(|&i| {
            let rest = &after_open[i + 4..];
            let line_end = rest.find('\n').unwrap_or(rest.len());
            rest[..line_end].trim().is_empty()
        })
        .ok_or("missing closing --- for frontmatter")?;

    let frontmatter = after_open[..close_pos].trim();
    let body = after_open[close_pos + 4..].trim();
    Ok(Some((frontmatter, body)))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("my-skill"));
        assert!(validate_name("a"));
        assert!(validate_name("skill123"));
        assert!(!validate_name(""));
        assert!(!validate_name("-bad"));
        assert!(!validate_name("bad-"));
        assert!(!validate_name("Bad"));
        assert!(!validate_name("has space"));
        assert!(!validate_name("has--double"));
        assert!(!validate_name("plugin:skill"));
        assert!(!validate_name(&"a".repeat(65)));
    }

    #[test]
    fn test_parse_skill() {
        let content = r#"---
name: fastapi-endpoint
description: Use when adding a FastAPI route with request/response models
license: MIT
allowed-tools:
  - Read
  - Write
---

# FastAPI endpoint

Create the router first.
"#;
        let doc = parse_skill(content, Path::new("/p/skills/fastapi/SKILL.md"))
            .unwrap()
            .document;
        assert_eq!(doc.name, "fastapi-endpoint");
        assert_eq!(
            doc.description,
            "Use when adding a FastAPI route with request/response models"
        );
        assert_eq!(doc.invocation_mode, InvocationMode::ModelInvokedSkill);
        assert_eq!(doc.license.as_deref(), Some("MIT"));
        assert_eq!(doc.allowed_tools, vec!["Read", "Write"]);
        assert!(doc.body.starts_with("# FastAPI endpoint"));
        assert!(!doc.body.contains("---"));
    }

    #[test]
    fn test_skill_missing_description() {
        let content = "---\nname: tdd\n---\nWrite the test first.\n";
        let err = parse_skill(content, Path::new("/p/skills/tdd/SKILL.md")).unwrap_err();
        match err {
            Error::MalformedDocument { reason, .. } => assert!(reason.contains("description")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skill_blank_name() {
        let content = "---\nname: \"  \"\ndescription: something\n---\nbody\n";
        assert!(matches!(
            parse_skill(content, Path::new("/tmp/SKILL.md")),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_skill_invalid_name_rejected() {
        let content = "---\nname: Bad-Name\ndescription: x\n---\nbody\n";
        assert!(parse_skill(content, Path::new("/tmp/SKILL.md")).is_err());
    }

    #[test]
    fn test_skill_without_frontmatter() {
        let content = "# No frontmatter\nJust markdown.";
        assert!(matches!(
            parse_skill(content, Path::new("/tmp/SKILL.md")),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let content = "---\nname: test\nno closing\n";
        assert!(parse_skill(content, Path::new("/tmp/SKILL.md")).is_err());

        let parsed = parse_command(content, Path::new("/tmp/test.md")).unwrap();
        assert_eq!(parsed.document.name, "test");
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("missing closing ---"));
    }

    #[test]
    fn test_command_without_header() {
        let content = "# Create plan\n\nDraft an implementation plan before touching code.\n";
        let parsed = parse_command(content, Path::new("/p/commands/create-plan.md")).unwrap();
        assert!(parsed.warnings.is_empty());
        let doc = parsed.document;
        assert_eq!(doc.name, "create-plan");
        assert_eq!(doc.invocation_mode, InvocationMode::ExplicitCommand);
        assert_eq!(
            doc.description,
            "Draft an implementation plan before touching code."
        );
        assert!(doc.argument_hint.is_none());
    }

    #[test]
    fn test_command_with_header() {
        let content = "---\ndescription: Create a git commit\nargument-hint: \"[message]\"\nallowed-tools: Bash(git add:*), Bash(git commit:*)\n---\n\nStage and commit.\n";
        let doc = parse_command(content, Path::new("/p/commands/commit.md"))
            .unwrap()
            .document;
        assert_eq!(doc.name, "commit");
        assert_eq!(doc.description, "Create a git commit");
        assert_eq!(doc.argument_hint.as_deref(), Some("[message]"));
        assert_eq!(doc.allowed_tools, vec!["Bash(git add:*)", "Bash(git commit:*)"]);
        assert_eq!(doc.body, "Stage and commit.");
    }

    #[test]
    fn test_command_header_without_description_falls_back_to_body() {
        let content = "---\nargument-hint: <file>\n---\n# Title\nFormat the given file.\n";
        let doc = parse_command(content, Path::new("/p/commands/fmt.md"))
            .unwrap()
            .document;
        assert_eq!(doc.description, "Format the given file.");
    }

    #[test]
    fn test_markdown_rule_is_not_frontmatter() {
        let content = "----\nJust a rule above text.\n";
        let doc = parse_command(content, Path::new("/p/commands/rule.md"))
            .unwrap()
            .document;
        assert_eq!(doc.description, "----");
    }

    #[test]
    fn test_derive_description_truncates() {
        let body = format!("# Heading\n\n{}", "x".repeat(300));
        assert_eq!(derive_description(&body).len(), MAX_DERIVED_DESCRIPTION);
        assert_eq!(derive_description("# only a heading"), "");
    }

    #[test]
    fn test_argument_hint_as_yaml_sequence() {
        let content = "---\ndescription: Create a git commit\nargument-hint: [message]\n---\nCommit.\n";
        let parsed = parse_command(content, Path::new("/p/commands/commit.md")).unwrap();
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.document.description, "Create a git commit");
        assert_eq!(parsed.document.argument_hint.as_deref(), Some("message"));

        let content = "---\nargument-hint: [pr-number, priority]\n---\nReview a PR.\n";
        let doc = parse_command(content, Path::new("/p/commands/review.md"))
            .unwrap()
            .document;
        assert_eq!(doc.argument_hint.as_deref(), Some("pr-number priority"));
    }

    #[test]
    fn test_command_keeps_loading_with_bad_header() {
        let content = "---\nargument-hint: [pr-number\n---\nReview a pull request.\n";
        let parsed = parse_command(content, Path::new("/p/commands/review.md")).unwrap();
        assert_eq!(parsed.document.name, "review");
        assert_eq!(parsed.document.description, "Review a pull request.");
        assert!(parsed.document.argument_hint.is_none());
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("header ignored"));
    }

    #[test]
    fn test_wrong_shaped_optional_field_is_dropped() {
        let content = "---\nname: tdd\ndescription: Use when writing tests first\nlicense:\n  spdx: MIT\nallowed-tools: [Read, Write]\n---\nbody\n";
        let parsed = parse_skill(content, Path::new("/p/skills/tdd/SKILL.md")).unwrap();
        assert_eq!(parsed.document.name, "tdd");
        assert!(parsed.document.license.is_none());
        assert_eq!(parsed.document.allowed_tools, vec!["Read", "Write"]);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("`license`"));
    }

    #[test]
    fn test_command_name_with_qualifier_rejected() {
        assert!(matches!(
            parse_command("Deploy.", Path::new("/p/commands/ops:deploy.md")),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_closing_delimiter_must_be_its_own_line() {
        let (yaml, body) = split_frontmatter("---\na: 1\n----\nb: 2\n---\nbody\n")
            .unwrap()
            .unwrap();
        assert_eq!(yaml, "a: 1\n----\nb: 2");
        assert_eq!(body, "body");

        let (yaml, body) = split_frontmatter("---\r\na: 1\r\n---\r\nbody").unwrap().unwrap();
        assert_eq!(yaml, "a: 1");
        assert_eq!(body, "body");

        assert!(split_frontmatter("---\na: 1\n---text\n").is_err());
    }
}
