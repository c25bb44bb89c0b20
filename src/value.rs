//! Dynamic values that flow through the machine.
//!
//! User payloads keep their concrete types at the API surface; inside the
//! machine they travel as boxed `Any` values. `Value` is deliberately not
//! `Clone` so move-only resources pass through suspensions unchanged.

use std::any::Any;

/// A type-erased value with its type name captured for diagnostics.
pub struct Value {
    payload: Box<dyn Any>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: 'static>(value: T) -> Self {
        Value {
            payload: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The unit value, used to kick off evaluation and for `()` resumes.
    pub fn unit() -> Self {
        Value::new(())
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Move the payload out, or hand the value back untouched on mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Value> {
        match self.payload.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(payload) => Err(Value {
                payload,
                type_name: self.type_name,
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let v = Value::new(42i64);
        assert!(v.is::<i64>());
        assert_eq!(v.downcast::<i64>().unwrap(), 42);
    }

    #[test]
    fn test_value_downcast_mismatch_returns_value() {
        let v = Value::new("hello".to_string());
        let v = v.downcast::<i64>().unwrap_err();
        assert_eq!(v.downcast::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_value_is_move_only() {
        let buf = vec![1u8, 2, 3];
        let v = Value::new(buf);
        let back: Vec<u8> = v.downcast().unwrap();
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn test_value_type_name() {
        let v = Value::unit();
        assert_eq!(v.type_name(), "()");
    }
}
