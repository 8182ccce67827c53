use async_graphql_value::ConstValue;
use serde_json::Value;

/// Serialization of a leaf type's runtime value into the response, and parsing of input literals.
///
/// Errors are plain messages; the engine attaches path and code.
pub trait ScalarSerializer: Send + Sync + 'static {
    fn serialize(&self, value: Value) -> Result<Value, String>;

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        value.clone().into_json().map_err(|err| err.to_string())
    }
}

pub(crate) const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub(crate) struct IntScalar;

impl ScalarSerializer for IntScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        let n = match &value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        };
        match n {
            Some(n) if i32::try_from(n).is_ok() => Ok(Value::from(n)),
            Some(n) => Err(format!("Int cannot represent non 32-bit signed integer value: {n}")),
            None => Err(format!("Int cannot represent non-integer value: {value}")),
        }
    }

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        match value {
            ConstValue::Number(n) => match n.as_i64() {
                Some(n) if i32::try_from(n).is_ok() => Ok(Value::from(n)),
                _ => Err(format!("Int cannot represent non 32-bit signed integer value: {n}")),
            },
            other => Err(format!("Int cannot represent non-integer value: {other}")),
        }
    }
}

pub(crate) struct FloatScalar;

impl ScalarSerializer for FloatScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        match &value {
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(Value::from)
                .ok_or_else(|| format!("Float cannot represent non numeric value: {value}")),
            Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
            _ => Err(format!("Float cannot represent non numeric value: {value}")),
        }
    }

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        match value {
            ConstValue::Number(n) => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| format!("Float cannot represent non numeric value: {n}")),
            other => Err(format!("Float cannot represent non numeric value: {other}")),
        }
    }
}

pub(crate) struct StringScalar;

impl ScalarSerializer for StringScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::String(_) => Ok(value),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(format!("String cannot represent value: {other}")),
        }
    }

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        match value {
            ConstValue::String(s) => Ok(Value::String(s.clone())),
            other => Err(format!("String cannot represent a non string value: {other}")),
        }
    }
}

pub(crate) struct BooleanScalar;

impl ScalarSerializer for BooleanScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::Bool(_) => Ok(value),
            Value::Number(ref n) if n.as_i64().is_some() => Ok(Value::Bool(n.as_i64() != Some(0))),
            other => Err(format!("Boolean cannot represent a non boolean value: {other}")),
        }
    }

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        match value {
            ConstValue::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(format!("Boolean cannot represent a non boolean value: {other}")),
        }
    }
}

pub(crate) struct IdScalar;

impl ScalarSerializer for IdScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::String(_) => Ok(value),
            Value::Number(ref n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            other => Err(format!("ID cannot represent value: {other}")),
        }
    }

    fn parse_literal(&self, value: &ConstValue) -> Result<Value, String> {
        match value {
            ConstValue::String(s) => Ok(Value::String(s.clone())),
            ConstValue::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            other => Err(format!("ID cannot represent value: {other}")),
        }
    }
}

/// Custom scalars without a registered serializer accept any JSON value.
pub(crate) struct PassthroughScalar;

impl ScalarSerializer for PassthroughScalar {
    fn serialize(&self, value: Value) -> Result<Value, String> {
        Ok(value)
    }
}
