// ABOUTME: Extracts imported class names from Java, Kotlin and Scala sources
// ABOUTME: Brace groups are expanded, renames keep the imported name, wildcards are dropped

use autodeps_core::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+(?P<static>static\s+)?(?P<body>[^;]+)")
        .expect("import pattern is a valid regex")
});

/// Selectors that import members in bulk rather than naming a class.
const BULK_SELECTORS: &[&str] = &["*", "_", "given"];

/// Classes imported by `source`, in order of first appearance.
pub fn scan_imports(source: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    import_statements(source)
        .iter()
        .flat_map(|statement| parse_import_line(statement))
        .filter(|class| seen.insert(class.clone()))
        .collect()
}

/// Import lines, with brace groups spread over several lines joined into one.
fn import_statements(source: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut lines = source.lines();
    while let Some(line) = lines.next() {
        if !IMPORT_LINE.is_match(line) {
            continue;
        }
        let mut statement = line.to_string();
        let mut depth = brace_depth(line);
        while depth > 0 {
            let Some(next) = lines.next() else {
                break;
            };
            statement.push(' ');
            statement.push_str(next.trim());
            depth += brace_depth(next);
        }
        statements.push(statement);
    }
    statements
}

fn brace_depth(text: &str) -> isize {
    text.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

pub fn scan_file(path: &Path) -> Result<Vec<String>> {
    let source = std::fs::read_to_string(path)?;
    Ok(scan_imports(&source))
}

/// Classes named by a single `import` line; empty for any other line.
pub fn parse_import_line(line: &str) -> Vec<String> {
    let Some(captures) = IMPORT_LINE.captures(line) else {
        return Vec::new();
    };
    let is_static = captures.name("static").is_some();
    let body = captures.name("body").map_or("", |m| m.as_str());
    let body = body.split("//").next().unwrap_or(body).trim();

    split_clauses(body)
        .into_iter()
        .flat_map(|clause| expand_clause(clause, is_static))
        .collect()
}

/// Splits `a.B, c.{D, E}` on the commas outside of braces.
fn split_clauses(body: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                clauses.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(&body[start..]);
    clauses
}

fn expand_clause(clause: &str, is_static: bool) -> Vec<String> {
    let clause = clause.trim();
    if let Some((prefix, group)) = clause.split_once('{') {
        let prefix = prefix.trim();
        let group = group.split('}').next().unwrap_or(group);
        return group
            .split(',')
            .filter_map(selector)
            .filter_map(|name| class_name(&format!("{prefix}{name}")))
            .collect();
    }

    let path = drop_rename(clause);
    let path = if is_static {
        // `import static a.B.member` needs the class `a.B`.
        path.rsplit_once('.').map_or(path, |(owner, _)| owner)
    } else {
        path
    };
    class_name(path).into_iter().collect()
}

/// `B => C` and `B as C` keep `B`; `B => _` hides `B` and yields nothing.
fn selector(selector: &str) -> Option<&str> {
    let selector = selector.trim();
    let (name, renamed) = match selector.split_once("=>") {
        Some((name, renamed)) => (name.trim(), Some(renamed.trim())),
        None => (drop_rename(selector), None),
    };
    if renamed == Some("_") || name.starts_with("given ") {
        return None;
    }
    Some(name)
}

fn drop_rename(path: &str) -> &str {
    path.split_once(" as ").map_or(path, |(name, _)| name).trim()
}

fn class_name(path: &str) -> Option<String> {
    let path: String = path
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '`')
        .collect();
    let last = path.rsplit('.').next().unwrap_or(path.as_str());
    if BULK_SELECTORS.contains(&last) {
        return None;
    }
    let valid = path.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    });
    valid.then_some(path)
}
