//! `@KEY@` placeholder substitution

use std::collections::BTreeMap;

/// Replace every `@KEY@` whose `KEY` is in `values`.
///
/// Placeholders with unknown keys are copied through untouched, as is any
/// stray `@`.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('@') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('@') {
            Some(end) if values.contains_key(&after[..end]) => {
                out.push_str(&values[&after[..end]]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('@');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_known_keys() {
        let out = render_template(
            "Name: @RSB_PKG_NAME@\nPrefix: @PREFIX@/@PREFIX@\n",
            &values(&[("RSB_PKG_NAME", "aarch64-config"), ("PREFIX", "/opt")]),
        );
        assert_eq!(out, "Name: aarch64-config\nPrefix: /opt//opt\n");
    }

    #[test]
    fn test_unknown_and_stray_at_untouched() {
        let vals = values(&[("A", "1")]);
        assert_eq!(render_template("mail me@host @UNKNOWN@ @A@", &vals), "mail me@host @UNKNOWN@ 1");
        assert_eq!(render_template("trailing @", &vals), "trailing @");
        assert_eq!(render_template("@@A@", &vals), "@1");
    }

    #[test]
    fn test_values_not_rescanned() {
        let vals = values(&[("A", "@B@"), ("B", "x")]);
        assert_eq!(render_template("@A@", &vals), "@B@");
    }
}
