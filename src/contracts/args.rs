use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::Param;
use eyre::{Result, WrapErr, eyre};
use serde_json::Value;

/// Arguments for a call, as they arrived on the command line
#[derive(Debug, Clone)]
pub enum CallArguments {
    /// A JSON array such as `["0xabc...", "100"]`
    Json(Option<String>),
    /// Positional tokens, each parsed against its parameter type
    Tokens(Vec<String>),
}

impl CallArguments {
    /// Number of supplied arguments, parsing the JSON form if needed
    pub fn count(&self) -> Result<usize> {
        match self {
            CallArguments::Json(raw) => Ok(parse_json_array(raw.as_deref())?.len()),
            CallArguments::Tokens(tokens) => Ok(tokens.len()),
        }
    }

    /// Convert to typed values for the given parameters
    pub fn coerce(&self, params: &[Param]) -> Result<Vec<DynSolValue>> {
        match self {
            CallArguments::Json(raw) => {
                coerce_json_args(params, &parse_json_array(raw.as_deref())?)
            }
            CallArguments::Tokens(tokens) => coerce_tokens(params, tokens),
        }
    }
}

/// Decode an optional JSON array; absent or blank input is an empty list
pub fn parse_json_array(raw: Option<&str>) -> Result<Vec<Value>> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(Vec::new()),
    };

    let value: Value = serde_json::from_str(raw)
        .wrap_err_with(|| format!("Arguments are not valid JSON: {}", raw))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(eyre!("Arguments must be a JSON array, got: {}", other)),
    }
}

fn check_count(params: &[Param], supplied: usize) -> Result<()> {
    if params.len() != supplied {
        return Err(eyre!(
            "Argument count mismatch: expected {} ({}), got {}",
            params.len(),
            describe_params(params),
            supplied
        ));
    }
    Ok(())
}

/// `address to, uint256 amount` style rendering for error messages
pub fn describe_params(params: &[Param]) -> String {
    if params.is_empty() {
        return "no parameters".to_string();
    }
    params
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                p.selector_type().into_owned()
            } else {
                format!("{} {}", p.selector_type(), p.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coerce JSON values to the declared parameter types
pub fn coerce_json_args(params: &[Param], values: &[Value]) -> Result<Vec<DynSolValue>> {
    check_count(params, values.len())?;

    params
        .iter()
        .zip(values)
        .map(|(param, value)| {
            let ty = resolve(param)?;
            json_to_sol(&ty, value)
                .wrap_err_with(|| format!("Invalid value for parameter {}", param_label(param)))
        })
        .collect()
}

/// Parse positional tokens with the declared parameter types
///
/// `string` parameters take the token verbatim, so `123` stays a string there.
pub fn coerce_tokens(params: &[Param], tokens: &[String]) -> Result<Vec<DynSolValue>> {
    check_count(params, tokens.len())?;

    params
        .iter()
        .zip(tokens)
        .map(|(param, token)| {
            let ty = resolve(param)?;
            match ty {
                DynSolType::String => Ok(DynSolValue::String(token.clone())),
                _ => ty.coerce_str(token).wrap_err_with(|| {
                    format!("Invalid value for parameter {}", param_label(param))
                }),
            }
        })
        .collect()
}

fn resolve(param: &Param) -> Result<DynSolType> {
    param
        .resolve()
        .wrap_err_with(|| format!("Could not resolve parameter type: {}", param))
}

fn param_label(param: &Param) -> String {
    if param.name.is_empty() {
        param.ty.clone()
    } else {
        format!("'{}' ({})", param.name, param.ty)
    }
}

fn json_to_sol(ty: &DynSolType, value: &Value) -> Result<DynSolValue> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => Ok(DynSolValue::Array(
            items
                .iter()
                .map(|item| json_to_sol(inner, item))
                .collect::<Result<_>>()?,
        )),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(eyre!("Expected {} elements, got {}", len, items.len()));
            }
            Ok(DynSolValue::FixedArray(
                items
                    .iter()
                    .map(|item| json_to_sol(inner, item))
                    .collect::<Result<_>>()?,
            ))
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(eyre!(
                    "Expected a tuple of {} elements, got {}",
                    types.len(),
                    items.len()
                ));
            }
            Ok(DynSolValue::Tuple(
                types
                    .iter()
                    .zip(items)
                    .map(|(t, item)| json_to_sol(t, item))
                    .collect::<Result<_>>()?,
            ))
        }
        (DynSolType::String, Value::String(s)) => Ok(DynSolValue::String(s.clone())),
        (DynSolType::String, Value::Number(n)) => Ok(DynSolValue::String(n.to_string())),
        (DynSolType::Bool, Value::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (_, Value::String(s)) => ty
            .coerce_str(s)
            .wrap_err_with(|| format!("Cannot parse {:?} as {}", s, ty)),
        (_, Value::Number(n)) => {
            let repr = n.to_string();
            ty.coerce_str(&repr)
                .wrap_err_with(|| format!("Cannot parse {} as {}", repr, ty))
        }
        (_, other) => Err(eyre!("Cannot use {} as {}", other, ty)),
    }
}
