//==================================================
// File: runtime/value.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Non-value taxonomy for evaluation results
// Objective: Distinguish void, undefined, and null results so the session
//            layer can decide what to print and what to log
//==================================================

use rhai::Dynamic;

use crate::glob::HostArray;

/// The engine's `undefined` marker, published as a global constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Undefined;

/// The engine's `null` marker, published as a global constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

/// Classified result of one evaluation.
///
/// `Void` is what a statement yields; `Undefined` and `Null` are the two
/// representable non-values scripts can produce on purpose; everything else
/// is a `Value`.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Void,
    Undefined,
    Null,
    Value(Dynamic),
}

impl ScriptValue {
    pub fn classify(value: Dynamic) -> Self {
        if value.is_unit() {
            ScriptValue::Void
        } else if value.is::<Undefined>() {
            ScriptValue::Undefined
        } else if value.is::<Null>() {
            ScriptValue::Null
        } else {
            ScriptValue::Value(value)
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ScriptValue::Void)
    }

    /// Textual form used for printing and transcript comments. `Void` has
    /// no textual form and is never printed.
    pub fn render(&self) -> String {
        match self {
            ScriptValue::Void => String::new(),
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Value(value) => render_dynamic(value),
        }
    }
}

/// Render a dynamic value the way the console shows it. Host arrays carry
/// their own display form; everything else uses the engine's.
pub fn render_dynamic(value: &Dynamic) -> String {
    if let Some(array) = value.read_lock::<HostArray>() {
        array.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_classifies_as_void() {
        assert!(ScriptValue::classify(Dynamic::UNIT).is_void());
    }

    #[test]
    fn markers_classify_and_render_by_name() {
        let null = ScriptValue::classify(Dynamic::from(Null));
        assert!(matches!(null, ScriptValue::Null));
        assert_eq!(null.render(), "null");

        let undefined = ScriptValue::classify(Dynamic::from(Undefined));
        assert!(matches!(undefined, ScriptValue::Undefined));
        assert_eq!(undefined.render(), "undefined");
    }

    #[test]
    fn ordinary_values_render_through_the_engine() {
        let value = ScriptValue::classify(Dynamic::from(42_i64));
        assert_eq!(value.render(), "42");
    }

    #[test]
    fn host_arrays_render_their_contents() {
        let value = ScriptValue::classify(Dynamic::from(HostArray(vec!["a".to_string()])));
        assert_eq!(value.render(), "[\"a\"]");
    }
}
