use std::collections::BTreeMap;

/// Parse `k=v` pairs separated by `separator`. Empty segments are skipped and a
/// key without `=` maps to an empty value.
pub fn parse_query_properties(raw: &str, separator: char) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for segment in raw.split(separator) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => {
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                properties.insert(segment.to_string(), String::new());
            }
        }
    }
    properties
}

/// Append query properties to a connection descriptor.
///
/// `?`/`&` style descriptors (MySQL, PostgreSQL) and `;` style descriptors
/// (SQLServer, H2) are both supported. Existing keys keep their position and
/// take the new value when overridden; new keys are appended in key order.
pub fn append_query_properties(url: &str, extra: &BTreeMap<String, String>) -> String {
    if extra.is_empty() {
        return url.to_string();
    }

    let semicolon_style = is_semicolon_style(url);
    let (base, existing_raw, separator) = if semicolon_style {
        match url.split_once(';') {
            Some((base, rest)) => (base, rest, ';'),
            None => (url, "", ';'),
        }
    } else {
        match url.split_once('?') {
            Some((base, rest)) => (base, rest, '&'),
            None => (url, "", '&'),
        }
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    for segment in existing_raw.split(separator).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let value = extra.get(key).map(String::as_str).unwrap_or(value);
        pairs.push((key.to_string(), value.to_string()));
    }
    for (key, value) in extra {
        if !pairs.iter().any(|(existing, _)| existing == key) {
            pairs.push((key.clone(), value.clone()));
        }
    }

    let rendered = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(&separator.to_string());

    if semicolon_style {
        format!("{};{}", base, rendered)
    } else {
        format!("{}?{}", base, rendered)
    }
}

fn is_semicolon_style(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("sqlserver:") || lower.contains(":h2:") || lower.starts_with("h2:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_properties() {
        let props = parse_query_properties("useSSL=false&serverTimezone=UTC&flag", '&');
        assert_eq!(props.get("useSSL").map(String::as_str), Some("false"));
        assert_eq!(props.get("serverTimezone").map(String::as_str), Some("UTC"));
        assert_eq!(props.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn test_append_to_url_without_properties() {
        let mut extra = BTreeMap::new();
        extra.insert("rewriteBatchedStatements".to_string(), "true".to_string());

        let url = append_query_properties("jdbc:mysql://127.0.0.1:3306/demo_ds", &extra);
        assert_eq!(url, "jdbc:mysql://127.0.0.1:3306/demo_ds?rewriteBatchedStatements=true");
    }

    #[test]
    fn test_append_overrides_existing_key_in_place() {
        let mut extra = BTreeMap::new();
        extra.insert("useSSL".to_string(), "true".to_string());
        extra.insert("stringtype".to_string(), "unspecified".to_string());

        let url = append_query_properties(
            "jdbc:postgresql://127.0.0.1:5432/demo_ds?useSSL=false&loggerLevel=OFF",
            &extra,
        );
        assert_eq!(
            url,
            "jdbc:postgresql://127.0.0.1:5432/demo_ds?useSSL=true&loggerLevel=OFF&stringtype=unspecified"
        );
    }

    #[test]
    fn test_append_semicolon_style() {
        let mut extra = BTreeMap::new();
        extra.insert("encrypt".to_string(), "false".to_string());

        let url = append_query_properties(
            "jdbc:sqlserver://127.0.0.1:1433;DatabaseName=demo_ds",
            &extra,
        );
        assert_eq!(url, "jdbc:sqlserver://127.0.0.1:1433;DatabaseName=demo_ds;encrypt=false");
    }
}
