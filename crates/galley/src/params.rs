//! Free-form engine keyword tables and the one merge rule every recipe
//! shares.

use serde_json::Value;

/// an ordered keyword table destined for an engine. values are arbitrary
/// JSON-shaped data; the engine rejects keys it does not recognize
pub type Params = serde_json::Map<String, Value>;

/// Overlay `overrides` on `defaults`: every key present in the overrides
/// replaces the default wholesale, including nested tables; keys only in the
/// defaults survive; keys only in the overrides are added.
///
/// No key validation happens here. Unknown keys flow through to the engine,
/// which owns the rejection.
pub fn merge(defaults: Params, overrides: &Params) -> Params {
    let mut merged = defaults;
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_overrides_are_identity() {
        let defaults = table(&[("fmax", json!(0.01)), ("steps", json!(1000))]);
        assert_eq!(merge(defaults.clone(), &Params::new()), defaults);
    }

    #[test]
    fn override_wins_per_key() {
        let defaults = table(&[("fmax", json!(0.01)), ("steps", json!(1000))]);
        let overrides = table(&[("fmax", json!(100.0)), ("extra", json!("x"))]);
        let merged = merge(defaults, &overrides);
        for (k, v) in &overrides {
            assert_eq!(&merged[k], v);
        }
        assert_eq!(merged["steps"], json!(1000));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn nested_tables_replace_not_recurse() {
        let defaults = table(&[(
            "scf",
            json!({ "algorithm": "diis", "maxiter": 50 }),
        )]);
        let overrides = table(&[("scf", json!({ "algorithm": "gdm" }))]);
        let merged = merge(defaults, &overrides);
        // the default sub-table is gone wholesale
        assert_eq!(merged["scf"], json!({ "algorithm": "gdm" }));
    }
}
