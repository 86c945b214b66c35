//! Lenient field decoders shared by the manifest types.
//!
//! Manifests are hand-written, so scalars show up as numbers or booleans where
//! a string is expected and collections are often written as `key:` with no
//! value. These helpers fold all of that into plain strings and empty
//! collections.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Render a YAML scalar as the string a runner would see.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => value_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(|v| value_to_string(&v))
        .unwrap_or_default())
}

/// `env`, `with` and `outputs` maps. Anything that is not a mapping (an
/// expression such as `${{ fromJSON(...) }}`) decodes as empty.
pub(crate) fn string_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Mapping(m)) => m
            .iter()
            .map(|(k, v)| (value_to_string(k), value_to_string(v)))
            .collect(),
        _ => IndexMap::new(),
    };
    Ok(map)
}

/// `required: true` and `required: "true"` both count.
pub(crate) fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    })
}

/// `needs: build` or `needs: [build, test]`.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Sequence(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![value_to_string(&other)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Probe {
        #[serde(deserialize_with = "scalar")]
        text: String,
        #[serde(deserialize_with = "string_map")]
        map: IndexMap<String, String>,
        #[serde(deserialize_with = "truthy")]
        flag: bool,
        #[serde(deserialize_with = "one_or_many")]
        list: Vec<String>,
        #[serde(deserialize_with = "null_as_default")]
        plain: Vec<String>,
    }

    #[test]
    fn absent_and_null_fields_are_empty() {
        let p: Probe = serde_yaml::from_str("text:\nmap:\nlist:\nplain:\n").unwrap();
        assert_eq!(p.text, "");
        assert!(p.map.is_empty());
        assert!(!p.flag);
        assert!(p.list.is_empty());
        assert!(p.plain.is_empty());
    }

    #[test]
    fn scalars_become_strings() {
        let p: Probe = serde_yaml::from_str("text: 42\nmap:\n  B: 1\n  A: true\n  C: x\n").unwrap();
        assert_eq!(p.text, "42");
        let entries: Vec<_> = p.map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(entries, vec![("B", "1"), ("A", "true"), ("C", "x")]);
    }

    #[test]
    fn expression_map_is_empty() {
        let p: Probe = serde_yaml::from_str("map: ${{ fromJSON(inputs.env) }}\n").unwrap();
        assert!(p.map.is_empty());
    }

    #[test]
    fn truthy_accepts_strings() {
        let p: Probe = serde_yaml::from_str("flag: 'true'\n").unwrap();
        assert!(p.flag);
        let p: Probe = serde_yaml::from_str("flag: false\n").unwrap();
        assert!(!p.flag);
    }

    #[test]
    fn one_or_many_forms() {
        let p: Probe = serde_yaml::from_str("list: build\n").unwrap();
        assert_eq!(p.list, vec!["build"]);
        let p: Probe = serde_yaml::from_str("list: [build, test]\n").unwrap();
        assert_eq!(p.list, vec!["build", "test"]);
    }
}
