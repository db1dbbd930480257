//! Build parameter layer merge
//!
//! Layers are JSON objects merged with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values; `overlay` wins on conflict.
///
/// Arrays are replaced rather than concatenated so that a later layer can
/// shorten `builder_opts` or the catalog.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"prefix": "/usr/local"}), json!({"prefix": "/opt/rtems/6"}));
        assert_eq!(result["prefix"], "/opt/rtems/6");
    }

    #[test]
    fn test_builder_opts_replaced() {
        let result = deep_merge(
            json!({"builder_opts": ["--jobs=4", "--keep-going"]}),
            json!({"builder_opts": ["--jobs=8"]}),
        );
        assert_eq!(result["builder_opts"], json!(["--jobs=8"]));
    }

    #[test]
    fn test_untouched_keys_survive() {
        let result = deep_merge(
            json!({"prefix": "/usr/local", "no_install": false}),
            json!({"no_install": true}),
        );
        assert_eq!(result["prefix"], "/usr/local");
        assert_eq!(result["no_install"], true);
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"revision": "0", "dry_run": false, "version": "6"});
        let file = json!({"revision": "5", "dry_run": true});
        let cli = json!({"revision": "6"});

        let result = merge_layers(vec![builtin, file, cli]);

        assert_eq!(result["revision"], "6");
        assert_eq!(result["dry_run"], true);
        assert_eq!(result["version"], "6");
    }
}
