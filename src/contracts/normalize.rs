use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::Param;
use serde_json::{Map, Value};

/// Convert a decoded ABI value into plain JSON
///
/// Integers of any width become decimal strings. Tuples whose components are
/// all named become objects keyed by name; otherwise they become arrays.
pub fn normalize(value: &DynSolValue, components: &[Param]) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Address(addr) => Value::String(addr.to_checksum(None)),
        DynSolValue::Function(f) => Value::String(format!("0x{}", hex::encode(f.as_slice()))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, components))
                .collect(),
        ),
        DynSolValue::Tuple(fields) => named_or_positional(
            fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let param = components.get(i);
                    let nested = param.map(|p| p.components.as_slice()).unwrap_or(&[]);
                    (param.map(|p| p.name.as_str()), normalize(field, nested))
                })
                .collect(),
        ),
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{:?}", other)),
    }
}

/// Convert a function's decoded outputs: nothing is `null`, one output is the
/// bare value, several are an object by name (or an array if any is unnamed)
pub fn normalize_outputs(values: &[DynSolValue], outputs: &[Param]) -> Value {
    match values {
        [] => Value::Null,
        [single] => normalize(
            single,
            outputs.first().map(|p| p.components.as_slice()).unwrap_or(&[]),
        ),
        _ => named_or_positional(
            values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let param = outputs.get(i);
                    let nested = param.map(|p| p.components.as_slice()).unwrap_or(&[]);
                    (param.map(|p| p.name.as_str()), normalize(value, nested))
                })
                .collect(),
        ),
    }
}

/// Object keyed by name when every entry is named, else a positional array
pub(crate) fn named_or_positional(entries: Vec<(Option<&str>, Value)>) -> Value {
    let all_named = !entries.is_empty()
        && entries
            .iter()
            .all(|(name, _)| name.is_some_and(|n| !n.is_empty()));

    if all_named {
        let mut map = Map::new();
        for (name, value) in entries {
            if let Some(name) = name {
                map.insert(name.to_string(), value);
            }
        }
        Value::Object(map)
    } else {
        Value::Array(entries.into_iter().map(|(_, value)| value).collect())
    }
}
