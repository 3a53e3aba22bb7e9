//! `$[name]` reference templates

/// Prefix of placeholder values produced in dry-run mode; such references
/// are never resolved.
pub const DRY_VALUE_PREFIX: &str = "dryValue:";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Reference(&'a str),
}

/// Split `template` into literal text and `$[name]` references.
///
/// An unterminated `$[` and the empty reference `$[]` are kept as text.
pub fn parse_template(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("$[") {
        let after = &rest[start + 2..];
        let Some(end) = after.find(']') else {
            break;
        };
        let name = &after[..end];
        if name.trim().is_empty() {
            segments.push(Segment::Text(&rest[..start + 3 + end]));
        } else {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            segments.push(Segment::Reference(name));
        }
        rest = &after[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// Placeholder standing in for a live value during dry runs.
pub fn dry_value(name: &str) -> String {
    format!("$[{}{}]", DRY_VALUE_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_references_from_text() {
        assert_eq!(
            parse_template("//input[@name='$[field]' and @id='$[id]']"),
            vec![
                Segment::Text("//input[@name='"),
                Segment::Reference("field"),
                Segment::Text("' and @id='"),
                Segment::Reference("id"),
                Segment::Text("']"),
            ]
        );
    }

    #[test]
    fn unterminated_and_empty_references_stay_literal() {
        assert_eq!(parse_template("a $[b"), vec![Segment::Text("a $[b")]);
        assert_eq!(parse_template("$[]x"), vec![Segment::Text("$[]"), Segment::Text("x")]);
        assert!(parse_template("").is_empty());
    }

    #[test]
    fn dry_values_are_references() {
        assert_eq!(dry_value("q"), "$[dryValue:q]");
        assert_eq!(parse_template(&dry_value("q")), vec![Segment::Reference("dryValue:q")]);
    }
}
