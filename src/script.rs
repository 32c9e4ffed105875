//! Custom transform evaluation for user-supplied read/write scripts.
//!
//! A script is an `evalexpr` expression with the raw primitive bound as `value`;
//! the expression's result is the transform output. The contract is one primitive
//! in, one primitive out. Expressions have no loops or recursion, so evaluation
//! always terminates; a script can fail, never hang.

use crate::codec::CodecError;
use crate::value::SignalValue;
use evalexpr::{ContextWithMutableVariables, HashMapContext, Value};

/// Run `source` with `input` bound as `value`. Any evaluation failure, including a
/// non-primitive result, maps to [`CodecError::CustomScript`].
pub(crate) fn transform(source: &str, input: &SignalValue) -> Result<SignalValue, CodecError> {
    let mut context = HashMapContext::new();
    context
        .set_value("value".to_string(), to_expr_value(input)?)
        .map_err(|e| CodecError::CustomScript(e.to_string()))?;
    let result = evalexpr::eval_with_context(source, &context)
        .map_err(|e| CodecError::CustomScript(e.to_string()))?;
    from_expr_value(result)
}

fn to_expr_value(v: &SignalValue) -> Result<Value, CodecError> {
    match v {
        SignalValue::Bool(b) => Ok(Value::Boolean(*b)),
        SignalValue::Float(x) => Ok(Value::Float(*x as f64)),
        SignalValue::Double(x) => Ok(Value::Float(*x)),
        SignalValue::Text(s) => Ok(Value::String(s.clone())),
        SignalValue::U64(x) => match i64::try_from(*x) {
            Ok(n) => Ok(Value::Int(n)),
            // Out of i64 range: hand the script a float rather than failing.
            Err(_) => Ok(Value::Float(*x as f64)),
        },
        SignalValue::Bytes(_) => Err(CodecError::CustomScript(
            "transform input must be a primitive, not raw bytes".to_string(),
        )),
        other => Ok(Value::Int(other.as_i64().unwrap_or_default())),
    }
}

fn from_expr_value(v: Value) -> Result<SignalValue, CodecError> {
    match v {
        Value::Int(n) => Ok(SignalValue::I64(n)),
        Value::Float(x) => Ok(SignalValue::Double(x)),
        Value::Boolean(b) => Ok(SignalValue::Bool(b)),
        Value::String(s) => Ok(SignalValue::Text(s)),
        other => Err(CodecError::CustomScript(format!(
            "transform must produce a primitive, got {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_a_raw_integer() {
        let out = transform("value * 10 + 2", &SignalValue::U16(12)).unwrap();
        assert_eq!(out, SignalValue::I64(122));
    }

    #[test]
    fn float_math_produces_double() {
        let out = transform("value / 2.0", &SignalValue::U8(5)).unwrap();
        assert_eq!(out, SignalValue::Double(2.5));
    }

    #[test]
    fn syntax_error_is_a_script_error() {
        let err = transform("value +* 1", &SignalValue::U8(1)).unwrap_err();
        assert!(matches!(err, CodecError::CustomScript(_)));
    }

    #[test]
    fn unknown_variable_is_a_script_error() {
        let err = transform("raw * 2", &SignalValue::U8(1)).unwrap_err();
        assert!(matches!(err, CodecError::CustomScript(_)));
    }
}
