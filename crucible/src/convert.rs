//! Type converters turn a bound string constant into a typed value during
//! compilation (§4.E step 4). Built-ins cover the primitives; modules
//! register more with `Binder::convert_to_types`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ErrorCode, Message};
use crate::key::TypeLiteral;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub trait TypeConverter: Send + Sync {
    /// Whether this converter claims `target` (usually an exact [`TypeLiteral`]
    /// match; a converter covering several related types may match more than
    /// one).
    fn accepts(&self, target: &TypeLiteral) -> bool;

    fn convert(&self, value: &str, target: &TypeLiteral) -> Result<Arc<dyn std::any::Any + Send + Sync>, Message>;
}

impl fmt::Debug for dyn TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeConverter")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A converter for one `FromStr` primitive, registered once per type in
/// [`builtins`].
struct ParseConverter<T> {
    target: TypeLiteral,
    _marker: std::marker::PhantomData<T>,
}

impl<T> ParseConverter<T>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: std::fmt::Display,
{
    fn new() -> Arc<dyn TypeConverter> {
        Arc::new(Self {
            target: TypeLiteral::of::<T>(),
            _marker: std::marker::PhantomData,
        })
    }
}

impl<T> TypeConverter for ParseConverter<T>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: std::fmt::Display,
{
    fn accepts(&self, target: &TypeLiteral) -> bool {
        target.type_id() == self.target.type_id()
    }

    fn convert(&self, value: &str, target: &TypeLiteral) -> Result<Arc<dyn std::any::Any + Send + Sync>, Message> {
        value.parse::<T>().map(|v| Arc::new(v) as Arc<dyn std::any::Any + Send + Sync>).map_err(|e| {
            Message::new(
                ErrorCode::ConverterFailed,
                format!("cannot convert {value:?} to {}: {e}", target.name()),
            )
        })
    }
}

/// Registry of known converters, consulted in registration order; the
/// compiler's constant-conversion pass (§4.E step 4) reports
/// [`ErrorCode::ConverterFailed`] when none accept the target type.
pub struct TypeConverterRegistry {
    converters: Vec<Arc<dyn TypeConverter>>,
}

impl TypeConverterRegistry {
    pub fn with_builtins() -> Self {
        Self {
            converters: builtins(),
        }
    }

    pub fn register(&mut self, converter: Arc<dyn TypeConverter>) {
        self.converters.push(converter);
    }

    pub fn convert(&self, value: &str, target: &TypeLiteral) -> Result<Arc<dyn std::any::Any + Send + Sync>, Message> {
        for converter in self.converters.iter().rev() {
            if converter.accepts(target) {
                return converter.convert(value, target);
            }
        }
        Err(Message::new(
            ErrorCode::ConverterFailed,
            format!("no type converter registered for {}", target.name()),
        ))
    }
}

fn builtins() -> Vec<Arc<dyn TypeConverter>> {
    vec![
        ParseConverter::<bool>::new(),
        ParseConverter::<char>::new(),
        ParseConverter::<String>::new(),
        ParseConverter::<i8>::new(),
        ParseConverter::<i16>::new(),
        ParseConverter::<i32>::new(),
        ParseConverter::<i64>::new(),
        ParseConverter::<isize>::new(),
        ParseConverter::<u8>::new(),
        ParseConverter::<u16>::new(),
        ParseConverter::<u32>::new(),
        ParseConverter::<u64>::new(),
        ParseConverter::<usize>::new(),
        ParseConverter::<f32>::new(),
        ParseConverter::<f64>::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_primitive() {
        let registry = TypeConverterRegistry::with_builtins();
        let target = TypeLiteral::of::<i32>();
        let value = registry.convert("42", &target).unwrap();
        assert_eq!(*value.downcast_ref::<i32>().unwrap(), 42);
    }

    #[test]
    fn reports_missing_converter() {
        struct Unconvertible;
        let registry = TypeConverterRegistry::with_builtins();
        let target = TypeLiteral::of::<Unconvertible>();
        assert!(registry.convert("x", &target).is_err());
    }
}
