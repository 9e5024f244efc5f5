/// Error for query strings that cannot be read at all.
#[derive(Debug)]
pub struct ParamError {
    pub message: String,
}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParamError {}

/// Parse a raw query string into ordered key/value pairs.
///
/// Keys such as `filter[semester]` are returned verbatim (percent-decoded);
/// interpreting them is up to the caller.
pub fn parse_query_string(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Encode key/value pairs back into a query string.
pub fn encode_query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

/// Read a bracketed parameter name such as `filter[semester]`.
///
/// Returns `("filter", Some("semester"))`, or `(key, None)` for plain keys.
/// A malformed bracket is an error.
pub fn split_bracketed(key: &str) -> Result<(&str, Option<&str>), ParamError> {
    let Some(open) = key.find('[') else {
        return Ok((key, None));
    };
    let inner = key[open + 1..]
        .strip_suffix(']')
        .filter(|inner| !inner.is_empty() && !inner.contains(['[', ']']))
        .ok_or_else(|| ParamError {
            message: format!("Malformed query parameter '{key}'"),
        })?;
    Ok((&key[..open], Some(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_keys() {
        assert_eq!(split_bracketed("filter[semester]").unwrap(), ("filter", Some("semester")));
        assert_eq!(split_bracketed("sort").unwrap(), ("sort", None));
        assert!(split_bracketed("filter[").is_err());
        assert!(split_bracketed("filter[]").is_err());
        assert!(split_bracketed("filter[a][b]").is_err());
    }

    #[test]
    fn decodes_percent_encoding() {
        let pairs = parse_query_string(Some("filter%5Bsport%5D=BAS&sort=-number"));
        assert_eq!(
            pairs,
            vec![
                ("filter[sport]".to_string(), "BAS".to_string()),
                ("sort".to_string(), "-number".to_string()),
            ]
        );
    }

    #[test]
    fn encodes_round_trip() {
        let qs = encode_query_string([("filter[name]", "Ball games"), ("page", "2")]);
        assert_eq!(parse_query_string(Some(&qs)).len(), 2);
        assert!(qs.contains("page=2"));
    }
}
