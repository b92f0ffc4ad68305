use std::fs;
use std::path::Path;

use alloy::json_abi::{Function, JsonAbi, Param, StateMutability};
use eyre::{Result, WrapErr, eyre};
use serde_json::Value;

/// Check the raw shape of an ABI: an array of objects each carrying a string `type`
pub fn validate_abi(abi: &Value) -> Result<()> {
    let entries = abi
        .as_array()
        .ok_or_else(|| eyre!("ABI must be a JSON array"))?;

    for (i, entry) in entries.iter().enumerate() {
        match entry.get("type") {
            Some(Value::String(_)) => {}
            Some(_) => return Err(eyre!("ABI entry {} has a non-string \"type\" field", i)),
            None => return Err(eyre!("ABI entry {} is missing a \"type\" field", i)),
        }
    }

    Ok(())
}

/// Take the `abi` member of a compiler artifact, or the value itself when it is a bare ABI
pub fn extract_abi(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.contains_key("abi") => obj.remove("abi").unwrap_or_default(),
        other => other,
    }
}

/// Read an ABI from a plain ABI file or a compiler artifact
pub fn read_abi_file(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).wrap_err_with(|| format!("Failed to read ABI file {:?}", path))?;
    let value: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("ABI file {:?} is not valid JSON", path))?;
    Ok(extract_abi(value))
}

/// Parse an ABI JSON value into a typed interface
pub fn parse_abi(abi: &Value) -> Result<JsonAbi> {
    validate_abi(abi)?;
    serde_json::from_value(abi.clone()).wrap_err("Failed to parse ABI")
}

/// Names of all callable functions, sorted and without overload duplicates
pub fn function_names(abi: &JsonAbi) -> Vec<String> {
    // `JsonAbi::functions` is keyed by name in a BTreeMap, so already sorted
    abi.functions.keys().cloned().collect()
}

/// Find a function by name, picking the overload whose arity matches
pub fn find_function<'a>(abi: &'a JsonAbi, name: &str, arg_count: usize) -> Result<&'a Function> {
    let overloads = abi.function(name).filter(|o| !o.is_empty()).ok_or_else(|| {
        let available = function_names(abi);
        if available.is_empty() {
            eyre!("Function '{}' not found in ABI (it declares no functions)", name)
        } else {
            eyre!(
                "Function '{}' not found in ABI. Available functions: {}",
                name,
                available.join(", ")
            )
        }
    })?;

    Ok(overloads
        .iter()
        .find(|f| f.inputs.len() == arg_count)
        .unwrap_or(&overloads[0]))
}

/// Determine if a function is a read or write operation
pub fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

/// First parameterless read-only function, used to check a contract answers
pub fn probe_function(abi: &JsonAbi) -> Option<&Function> {
    abi.functions()
        .find(|f| f.inputs.is_empty() && is_read_only(f))
}

/// Declared constructor parameters, empty when there is no constructor
pub fn constructor_inputs(abi: &JsonAbi) -> &[Param] {
    abi.constructor()
        .map(|c| c.inputs.as_slice())
        .unwrap_or(&[])
}
