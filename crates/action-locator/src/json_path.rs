//! Minimal JSON path selection
//!
//! Supported: `$`, `.field`, `['field']`, `["field"]`, `[n]`, `.*` and `[*]`.

use serde_json::Value;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Step {
    Field(String),
    Index(usize),
    Wildcard,
}

fn parse(expression: &str) -> Result<Vec<Step>, String> {
    let expression = expression.trim();
    let mut rest = expression
        .strip_prefix('$')
        .ok_or_else(|| format!("json path must start with '$': {}", expression))?;
    let mut steps = Vec::new();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            if after.starts_with('.') {
                return Err("recursive descent is not supported".to_string());
            }
            if let Some(after) = after.strip_prefix('*') {
                steps.push(Step::Wildcard);
                rest = after;
                continue;
            }
            let end = after.find(['.', '[']).unwrap_or(after.len());
            if end == 0 {
                return Err(format!("empty field name in '{}'", expression));
            }
            steps.push(Step::Field(after[..end].to_string()));
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let end = after
                .find(']')
                .ok_or_else(|| format!("unclosed '[' in '{}'", expression))?;
            let inner = after[..end].trim();
            let step = if inner == "*" {
                Step::Wildcard
            } else if let Some(quoted) = unquote(inner) {
                Step::Field(quoted.to_string())
            } else {
                inner
                    .parse::<usize>()
                    .map(Step::Index)
                    .map_err(|_| format!("invalid index '{}' in '{}'", inner, expression))?
            };
            steps.push(step);
            rest = &after[end + 1..];
        } else {
            return Err(format!("unexpected '{}' in '{}'", rest, expression));
        }
    }
    Ok(steps)
}

fn unquote(raw: &str) -> Option<&str> {
    raw.strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
}

/// Every value in `root` matched by `expression`.
pub fn select<'a>(root: &'a Value, expression: &str) -> Result<Vec<&'a Value>, String> {
    let mut current = vec![root];
    for step in parse(expression)? {
        current = current
            .into_iter()
            .flat_map(|value| -> Vec<&'a Value> {
                match (&step, value) {
                    (Step::Field(name), Value::Object(map)) => map.get(name).into_iter().collect(),
                    (Step::Index(i), Value::Array(items)) => items.get(*i).into_iter().collect(),
                    (Step::Wildcard, Value::Array(items)) => items.iter().collect(),
                    (Step::Wildcard, Value::Object(map)) => map.values().collect(),
                    _ => Vec::new(),
                }
            })
            .collect();
    }
    Ok(current)
}
