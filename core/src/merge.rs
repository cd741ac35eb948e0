/*!
    Structural merge of partial collection results.

    Collection stages each emit a mapping; merging them combines colliding
    keys by shape: mappings recurse, sets union, lists append unseen items in
    order, and two different scalars collapse into a set of both.
*/

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::MergeError;

/**
    Leaf value that can live inside a set.
*/
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// Non-integer number kept in its JSON text form.
    Number(String),
    Str(String),
}

impl Scalar {
    fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Number(n) => n.parse::<f64>().map(|f| f != 0.0).unwrap_or(true),
            Self::Str(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/**
    A mergeable value.

    A key's value may change shape on collision (scalar to set), so callers
    must not assume the shape they put in is the shape they get back.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Map(Mapping),
    List(Vec<Value>),
    Set(BTreeSet<Scalar>),
    Scalar(Scalar),
}

pub type Mapping = IndexMap<String, Value>;

impl Value {
    fn is_truthy(&self) -> bool {
        match self {
            Self::Map(m) => !m.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Set(s) => !s.is_empty(),
            Self::Scalar(s) => s.is_truthy(),
        }
    }

    fn into_scalars(self, key: &str) -> Result<Vec<Scalar>, MergeError> {
        match self {
            Self::Scalar(s) => Ok(vec![s]),
            Self::Set(set) => Ok(set.into_iter().collect()),
            Self::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Self::Scalar(s) => Ok(s),
                    _ => Err(MergeError::ShapeConflict(key.to_string())),
                })
                .collect(),
            Self::Map(_) => Err(MergeError::ShapeConflict(key.to_string())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Scalar(i.into())
    }
}

fn merge_value(existing: &mut Value, incoming: Value, key: &str) -> Result<(), MergeError> {
    match existing {
        Value::Map(target) => match incoming {
            Value::Map(source) => merge_into(target, source),
            other if other.is_truthy() => Err(MergeError::ShapeConflict(key.to_string())),
            _ => Ok(()),
        },
        Value::Set(set) => {
            set.extend(incoming.into_scalars(key)?);
            Ok(())
        }
        Value::List(list) => {
            if !incoming.is_truthy() {
                return Ok(());
            }
            let items = match incoming {
                Value::List(items) => items,
                Value::Map(_) => return Err(MergeError::ShapeConflict(key.to_string())),
                other => other
                    .into_scalars(key)?
                    .into_iter()
                    .map(Value::Scalar)
                    .collect(),
            };
            for item in items {
                if !list.contains(&item) {
                    list.push(item);
                }
            }
            Ok(())
        }
        Value::Scalar(current) => {
            if !incoming.is_truthy() {
                return Ok(());
            }
            let Value::Scalar(next) = incoming else {
                return Err(MergeError::ShapeConflict(key.to_string()));
            };
            let pair = BTreeSet::from([current.clone(), next]);
            *existing = Value::Set(pair);
            Ok(())
        }
    }
}

/// Merge `source` into `target` in place.
pub fn merge_into(target: &mut Mapping, source: Mapping) -> Result<(), MergeError> {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value, &key)?,
            None => {
                target.insert(key, value);
            }
        }
    }
    Ok(())
}

/**
    Merge any number of mappings left to right into a new mapping.

    Every input must be a `Value::Map`; anything else is rejected with the
    offending input's position.
*/
pub fn merge<I>(objects: I) -> Result<Mapping, MergeError>
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Mapping::new();
    for (index, object) in objects.into_iter().enumerate() {
        let Value::Map(map) = object else {
            return Err(MergeError::NotAMapping(index));
        };
        merge_into(&mut merged, map)?;
    }
    Ok(merged)
}

// ── JSON conversion ─────────────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Self::Scalar(Scalar::Null),
            Json::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Scalar(Scalar::Int(i)),
                None => Self::Scalar(Scalar::Number(n.to_string())),
            },
            Json::String(s) => Self::Scalar(Scalar::Str(s)),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Self::Null,
            Scalar::Bool(b) => Self::Bool(b),
            Scalar::Int(i) => Self::from(i),
            Scalar::Number(n) => n
                .parse::<serde_json::Number>()
                .map(Self::Number)
                .unwrap_or(Self::String(n)),
            Scalar::Str(s) => Self::String(s),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Map(map) => Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Value::List(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            Value::Set(set) => Self::Array(set.into_iter().map(Into::into).collect()),
            Value::Scalar(s) => s.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn list(items: Vec<i64>) -> Value {
        Value::List(items.into_iter().map(Value::from).collect())
    }

    #[test]
    fn test_list_union_preserves_order() {
        let merged = merge([map(vec![("a", list(vec![1, 2]))]), map(vec![("a", list(vec![2, 3]))])])
            .unwrap();
        assert_eq!(merged["a"], list(vec![1, 2, 3]));
    }

    #[test]
    fn test_scalar_collision_becomes_set() {
        let merged = merge([map(vec![("a", Value::from(1i64))]), map(vec![("a", Value::from(2i64))])]).unwrap();
        assert_eq!(
            merged["a"],
            Value::Set(BTreeSet::from([Scalar::Int(1), Scalar::Int(2)]))
        );
    }

    #[test]
    fn test_equal_scalar_collision_becomes_single_set() {
        let merged = merge([map(vec![("a", Value::from("x"))]), map(vec![("a", Value::from("x"))])]).unwrap();
        assert_eq!(merged["a"], Value::Set(BTreeSet::from([Scalar::from("x")])));
        let json: serde_json::Value = Value::Map(merged).into();
        assert_eq!(json, serde_json::json!({"a": ["x"]}));
    }

    #[test]
    fn test_falsy_scalar_does_not_collide() {
        let merged =
            merge([map(vec![("a", Value::from("x"))]), map(vec![("a", Value::from(""))])]).unwrap();
        assert_eq!(merged["a"], Value::from("x"));
    }

    #[test]
    fn test_nested_maps_recurse() {
        let left = map(vec![("g", map(vec![("c1", list(vec![1]))]))]);
        let right = map(vec![(
            "g",
            map(vec![("c1", list(vec![1, 4])), ("c2", list(vec![5]))]),
        )]);
        let merged = merge([left, right]).unwrap();
        assert_eq!(
            Value::Map(merged),
            map(vec![(
                "g",
                map(vec![("c1", list(vec![1, 4])), ("c2", list(vec![5]))])
            )])
        );
    }

    #[test]
    fn test_set_union() {
        let left = map(vec![("a", Value::Set(BTreeSet::from([Scalar::Int(1)])))]);
        let right = map(vec![("a", list(vec![1, 2]))]);
        let merged = merge([left, right]).unwrap();
        assert_eq!(
            merged["a"],
            Value::Set(BTreeSet::from([Scalar::Int(1), Scalar::Int(2)]))
        );
    }

    #[test]
    fn test_rejects_non_mapping_input() {
        let err = merge([map(vec![]), list(vec![1])]).unwrap_err();
        assert_eq!(err, MergeError::NotAMapping(1));
    }

    #[test]
    fn test_map_against_scalar_is_conflict() {
        let err = merge([map(vec![("a", map(vec![]))]), map(vec![("a", Value::from(1i64))])]).unwrap_err();
        assert_eq!(err, MergeError::ShapeConflict("a".into()));
    }

    #[test]
    fn test_json_round_trip_of_records() {
        let a: serde_json::Value = serde_json::json!({
            "news": {"CCTV1": [{"url": "u1", "origin": "hotel"}]}
        });
        let b: serde_json::Value = serde_json::json!({
            "news": {"CCTV1": [{"url": "u1", "origin": "hotel"}, {"url": "u2", "origin": "live"}]}
        });
        let merged = merge([Value::from(a), Value::from(b)]).unwrap();
        let json: serde_json::Value = Value::Map(merged).into();
        assert_eq!(
            json,
            serde_json::json!({
                "news": {"CCTV1": [
                    {"url": "u1", "origin": "hotel"},
                    {"url": "u2", "origin": "live"}
                ]}
            })
        );
    }

    #[test]
    fn test_float_survives_conversion() {
        let value = Value::from(serde_json::json!({"t": 1.5}));
        let Value::Map(ref m) = value else {
            panic!("expected a map");
        };
        assert_eq!(m["t"], Value::Scalar(Scalar::Number("1.5".into())));
        let json: serde_json::Value = value.into();
        assert_eq!(json, serde_json::json!({"t": 1.5}));
    }
}
