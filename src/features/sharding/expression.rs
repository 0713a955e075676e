//! Inline expressions for data nodes, e.g. `ds_${0..1}.t_order_${0..3}`.
//!
//! A placeholder is `${a..b}` (inclusive integer range) or `${[x, y]}`
//! (literal list); `$->{...}` is accepted as well. Placeholders expand as a
//! cartesian product, leftmost slowest. Top-level commas separate
//! expressions.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Choices(Vec<String>),
}

pub fn expand(expression: &str) -> Result<Vec<String>> {
    let mut result = Vec::new();
    for part in split_top_level(expression)? {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        result.extend(expand_one(&parse_segments(part)?));
    }
    Ok(result)
}

fn invalid(expression: &str, reason: &str) -> Error {
    Error::Config(format!("invalid inline expression '{}': {}", expression, reason))
}

fn split_top_level(expression: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (position, c) in expression.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid(expression, "unbalanced '}'"))?;
            }
            ',' if depth == 0 => {
                parts.push(&expression[start..position]);
                start = position + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid(expression, "unclosed placeholder"));
    }
    parts.push(&expression[start..]);
    Ok(parts)
}

fn parse_segments(expression: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = expression;

    while let Some(start) = rest.find('$') {
        let after = &rest[start + 1..];
        let body_start = if after.starts_with('{') {
            1
        } else if after.starts_with("->{") {
            3
        } else {
            return Err(invalid(expression, "'$' must open a placeholder"));
        };
        let body = &after[body_start..];
        let end = body
            .find('}')
            .ok_or_else(|| invalid(expression, "unclosed placeholder"))?;

        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        segments.push(Segment::Choices(parse_choices(expression, body[..end].trim())?));
        rest = &body[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

fn parse_choices(expression: &str, body: &str) -> Result<Vec<String>> {
    if let Some(list) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        let items: Vec<String> = list
            .split(',')
            .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return Err(invalid(expression, "empty list"));
        }
        return Ok(items);
    }

    let (from, to) = body
        .split_once("..")
        .ok_or_else(|| invalid(expression, "placeholder must be a range or a list"))?;
    let from: i64 = from
        .trim()
        .parse()
        .map_err(|_| invalid(expression, "range start is not an integer"))?;
    let to: i64 = to
        .trim()
        .parse()
        .map_err(|_| invalid(expression, "range end is not an integer"))?;
    if from > to {
        return Err(invalid(expression, "range start exceeds range end"));
    }
    Ok((from..=to).map(|value| value.to_string()).collect())
}

fn expand_one(segments: &[Segment]) -> Vec<String> {
    segments.iter().fold(vec![String::new()], |prefixes, segment| match segment {
        Segment::Literal(text) => prefixes
            .into_iter()
            .map(|prefix| prefix + text)
            .collect(),
        Segment::Choices(choices) => prefixes
            .iter()
            .flat_map(|prefix| choices.iter().map(move |choice| format!("{}{}", prefix, choice)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_expansion() {
        assert_eq!(
            expand("ds_${0..1}.t_order_${0..1}").unwrap(),
            vec!["ds_0.t_order_0", "ds_0.t_order_1", "ds_1.t_order_0", "ds_1.t_order_1"]
        );
    }

    #[test]
    fn test_lists_and_multiple_expressions() {
        assert_eq!(
            expand("ds_$->{['a', 'b']}.t_user, ds_c.t_user").unwrap(),
            vec!["ds_a.t_user", "ds_b.t_user", "ds_c.t_user"]
        );
        assert_eq!(expand("ds_0.t_plain").unwrap(), vec!["ds_0.t_plain"]);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(expand("ds_${0..1.t_order").is_err());
        assert!(expand("ds_${3..1}.t_order").is_err());
        assert!(expand("ds_${x}.t_order").is_err());
        assert!(expand("ds_$0.t_order").is_err());
    }
}
