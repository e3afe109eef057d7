//! Parameter extraction.
//!
//! Every handler parameter type implements [`IntentArg`], which tells the
//! binder where in the request to look ([`ArgSource`]), how to convert what
//! it finds ([`ConverterSpec`]) and how to project the result back into the
//! parameter type.
//!
//! Slot types implement the simpler [`SlotType`] and get [`IntentArg`] for
//! free. The wrappers compose:
//!
//! | Parameter type | Absent slot | Failed conversion |
//! |---|---|---|
//! | `T` | [`InvokeError::MissingArgument`] | [`InvokeError::Conversion`] |
//! | `Vec<T>` | empty list | [`InvokeError::Conversion`] |
//! | `Option<T>` | `None` | [`InvokeError::Conversion`] |
//! | `Result<T, ConversionError>` | [`InvokeError::MissingArgument`] | `Err(error)` |
//! | `Option<Result<T, ConversionError>>` | `None` | `Some(Err(error))` |
//!
//! ```rust,ignore
//! async fn forecast(
//!     location: String,                            // attributes["location"][0]
//!     date: Option<NaiveDate>,                     // attributes["date"][0], if any
//!     dates: Vec<NaiveDate>,                       // every attributes["dates"] value
//!     city: AttributeV2<String>,                   // attributesV2["city"][0]
//!     when: Result<NaiveDateTime, ConversionError>,
//!     session: Arc<Session>,
//! ) -> Response { ... }
//! ```

use std::any::type_name;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value;
use vox_core::{AttributeV2, Context, InvokeRequest, Session, TimeRange};

use crate::converter::{ConverterSpec, CustomConverter, ScalarType};
use crate::error::{ConversionError, InvokeError};
use crate::value::{BoundArg, SlotValue};

/// Where the binder finds a parameter's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgSource {
    /// The whole request.
    Request,
    /// The request's context.
    Context,
    /// The request's session.
    Session,
    /// The plain attribute with the parameter's name.
    Attributes,
    /// The typed attribute with the parameter's name.
    AttributesV2,
}

// ============================================================================
// SlotType
// ============================================================================

/// A type that can be converted from a slot value.
///
/// Implement this for custom slot types, pairing it with a
/// [`CustomConverter`]:
///
/// ```rust,ignore
/// struct Temperature(f64);
///
/// impl SlotType for Temperature {
///     fn converter() -> ConverterSpec {
///         ConverterSpec::Custom(CustomConverter::new("temperature", |raw: &Value| {
///             let celsius: f64 = require_str(raw)?.trim_end_matches("°C").parse()?;
///             Ok::<_, BoxError>(SlotValue::custom(Temperature(celsius)))
///         }))
///     }
///
///     fn from_slot(value: SlotValue) -> Option<Self> {
///         match value {
///             SlotValue::Custom(any) => any.downcast_ref::<Temperature>().map(|t| Temperature(t.0)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait SlotType: Sized + Send + 'static {
    fn converter() -> ConverterSpec;

    fn from_slot(value: SlotValue) -> Option<Self>;

    fn source() -> ArgSource {
        ArgSource::Attributes
    }

    /// The value bound when the slot is absent, if the type has one.
    fn absent() -> Option<Self> {
        None
    }
}

impl SlotType for String {
    fn converter() -> ConverterSpec {
        ConverterSpec::Scalar(ScalarType::Text)
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Text(text) => Some(text),
            SlotValue::Json(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
            _ => None,
        }
    }
}

macro_rules! impl_scalar_slot {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl SlotType for $ty {
                fn converter() -> ConverterSpec {
                    ConverterSpec::Scalar(ScalarType::$scalar)
                }

                fn from_slot(value: SlotValue) -> Option<Self> {
                    match value {
                        SlotValue::$scalar(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar_slot!(
    bool => Bool,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    TimeDelta => Duration,
);

impl SlotType for i64 {
    fn converter() -> ConverterSpec {
        ConverterSpec::Custom(CustomConverter::integer())
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl SlotType for Value {
    fn converter() -> ConverterSpec {
        ConverterSpec::PassThrough
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Json(value) => Some(value),
            SlotValue::Text(text) => Some(Value::String(text)),
            _ => None,
        }
    }
}

impl SlotType for TimeRange {
    fn converter() -> ConverterSpec {
        ConverterSpec::Custom(CustomConverter::time_range())
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Custom(any) => any.downcast_ref::<TimeRange>().copied(),
            _ => None,
        }
    }
}

/// A zero-based sequence position decoded from an ordinal slot.
///
/// Negative positions count from the end: `max` is `-1`, `prec` is `-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rank(pub i64);

impl Rank {
    /// Resolves the position against a sequence of `len` elements.
    pub fn index(self, len: usize) -> Option<usize> {
        let len = i64::try_from(len).ok()?;
        let index = if self.0 < 0 { len + self.0 } else { self.0 };
        (0..len).contains(&index).then_some(index as usize)
    }
}

impl SlotType for Rank {
    fn converter() -> ConverterSpec {
        ConverterSpec::Custom(CustomConverter::rank())
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        i64::from_slot(value).map(Rank)
    }
}

impl<T: SlotType> SlotType for Vec<T> {
    fn converter() -> ConverterSpec {
        ConverterSpec::list_of(T::converter())
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::List(items) => items.into_iter().map(T::from_slot).collect(),
            _ => None,
        }
    }

    fn source() -> ArgSource {
        T::source()
    }

    fn absent() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: SlotType> SlotType for AttributeV2<T> {
    fn converter() -> ConverterSpec {
        ConverterSpec::attribute(T::converter())
    }

    fn from_slot(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Attribute(attribute) => attribute.try_map(|v| T::from_slot(v).ok_or(())).ok(),
            _ => None,
        }
    }

    fn source() -> ArgSource {
        ArgSource::AttributesV2
    }
}

// ============================================================================
// IntentArg
// ============================================================================

/// A type usable as a handler parameter.
pub trait IntentArg: Sized + Send + 'static {
    fn source() -> ArgSource;

    fn converter() -> ConverterSpec;

    /// Projects the bound value of `parameter` into this type.
    fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError>;
}

impl<T: SlotType> IntentArg for T {
    fn source() -> ArgSource {
        T::source()
    }

    fn converter() -> ConverterSpec {
        T::converter()
    }

    fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError> {
        match arg {
            BoundArg::Value(value) => T::from_slot(value).ok_or_else(|| InvokeError::Argument {
                parameter: parameter.to_string(),
                expected: type_name::<T>(),
            }),
            BoundArg::Absent => T::absent().ok_or_else(|| InvokeError::MissingArgument {
                parameter: parameter.to_string(),
            }),
            BoundArg::Failed(error) => Err(InvokeError::Conversion {
                parameter: parameter.to_string(),
                error,
            }),
        }
    }
}

impl<T: IntentArg> IntentArg for Option<T> {
    fn source() -> ArgSource {
        T::source()
    }

    fn converter() -> ConverterSpec {
        T::converter()
    }

    fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError> {
        match arg {
            BoundArg::Absent => Ok(None),
            arg => T::from_bound(parameter, arg).map(Some),
        }
    }
}

impl<T: IntentArg> IntentArg for Result<T, ConversionError> {
    fn source() -> ArgSource {
        T::source()
    }

    fn converter() -> ConverterSpec {
        T::converter()
    }

    fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError> {
        match arg {
            BoundArg::Failed(error) => Ok(Err(error)),
            arg => T::from_bound(parameter, arg).map(Ok),
        }
    }
}

macro_rules! impl_contextual_arg {
    ($($ty:ty => $source:ident),* $(,)?) => {
        $(
            impl IntentArg for Arc<$ty> {
                fn source() -> ArgSource {
                    ArgSource::$source
                }

                fn converter() -> ConverterSpec {
                    ConverterSpec::PassThrough
                }

                fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError> {
                    match arg {
                        BoundArg::Value(SlotValue::$source(value)) => Ok(value),
                        _ => Err(InvokeError::Argument {
                            parameter: parameter.to_string(),
                            expected: type_name::<$ty>(),
                        }),
                    }
                }
            }

            impl IntentArg for $ty {
                fn source() -> ArgSource {
                    ArgSource::$source
                }

                fn converter() -> ConverterSpec {
                    ConverterSpec::PassThrough
                }

                fn from_bound(parameter: &str, arg: BoundArg) -> Result<Self, InvokeError> {
                    <Arc<$ty>>::from_bound(parameter, arg).map(Arc::unwrap_or_clone)
                }
            }
        )*
    };
}

impl_contextual_arg!(
    Context => Context,
    Session => Session,
    InvokeRequest => Request,
);

// ============================================================================
// ArgSpec / BoundArgs
// ============================================================================

/// The binding rule of one handler parameter, as declared by its type.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub source: ArgSource,
    pub converter: ConverterSpec,
    pub type_name: &'static str,
}

impl ArgSpec {
    pub fn of<T: IntentArg>() -> Self {
        Self {
            source: T::source(),
            converter: T::converter(),
            type_name: type_name::<T>(),
        }
    }
}

/// Bound arguments of one call, consumed in parameter order.
#[derive(Debug)]
pub struct BoundArgs {
    args: std::vec::IntoIter<(Arc<str>, BoundArg)>,
    expected: usize,
}

impl BoundArgs {
    pub fn new(args: Vec<(Arc<str>, BoundArg)>) -> Self {
        let expected = args.len();
        Self {
            args: args.into_iter(),
            expected,
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.len() == 0
    }

    /// Takes the next argument as a `T`.
    pub fn take<T: IntentArg>(&mut self) -> Result<T, InvokeError> {
        let (name, arg) = self.args.next().ok_or(InvokeError::ArgumentCount {
            expected: self.expected + 1,
            given: self.expected,
        })?;
        T::from_bound(&name, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure() -> ConversionError {
        ConversionError::new("to_date", json!("x"), vox_core::EntityError::Overflow)
    }

    #[test]
    fn test_sources() {
        assert_eq!(<String as IntentArg>::source(), ArgSource::Attributes);
        assert_eq!(<Vec<NaiveDate> as IntentArg>::source(), ArgSource::Attributes);
        assert_eq!(<AttributeV2<String> as IntentArg>::source(), ArgSource::AttributesV2);
        assert_eq!(
            <Vec<AttributeV2<NaiveDate>> as IntentArg>::source(),
            ArgSource::AttributesV2
        );
        assert_eq!(<Option<Arc<Context>> as IntentArg>::source(), ArgSource::Context);
        assert_eq!(<Session as IntentArg>::source(), ArgSource::Session);
        assert_eq!(<Arc<InvokeRequest> as IntentArg>::source(), ArgSource::Request);
    }

    #[test]
    fn test_converter_names() {
        assert_eq!(<NaiveDate as IntentArg>::converter().name(), "to_date");
        assert_eq!(
            <Option<Vec<AttributeV2<bool>>> as IntentArg>::converter().name(),
            "list[attribute[on_off_to_boolean]]"
        );
        assert_eq!(<Rank as IntentArg>::converter().name(), "rank");
    }

    #[test]
    fn test_plain_parameter() {
        assert_eq!(
            String::from_bound("name", BoundArg::Value(SlotValue::from("Ada"))).unwrap(),
            "Ada"
        );
        assert!(matches!(
            String::from_bound("name", BoundArg::Absent),
            Err(InvokeError::MissingArgument { parameter }) if parameter == "name"
        ));
        assert!(matches!(
            NaiveDate::from_bound("date", BoundArg::Failed(failure())),
            Err(InvokeError::Conversion { parameter, .. }) if parameter == "date"
        ));
        assert!(matches!(
            NaiveDate::from_bound("date", BoundArg::Value(SlotValue::Bool(true))),
            Err(InvokeError::Argument { .. })
        ));
    }

    #[test]
    fn test_optional_parameter() {
        assert_eq!(Option::<bool>::from_bound("on", BoundArg::Absent).unwrap(), None);
        assert_eq!(
            Option::<bool>::from_bound("on", BoundArg::Value(SlotValue::Bool(true))).unwrap(),
            Some(true)
        );
    }

    #[test]
    fn test_absent_list_is_empty() {
        assert!(Vec::<String>::from_bound("days", BoundArg::Absent).unwrap().is_empty());
        assert!(
            Vec::<AttributeV2<NaiveDate>>::from_bound("days", BoundArg::Absent)
                .unwrap()
                .is_empty()
        );
        assert_eq!(Option::<Vec<bool>>::from_bound("on", BoundArg::Absent).unwrap(), None);
        assert!(matches!(
            AttributeV2::<String>::from_bound("city", BoundArg::Absent),
            Err(InvokeError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_result_parameter_receives_failure() {
        let bound = Result::<NaiveDate, ConversionError>::from_bound(
            "date",
            BoundArg::Failed(failure()),
        )
        .unwrap();
        assert_eq!(bound.unwrap_err().converter(), "to_date");

        let optional = Option::<Result<NaiveDate, ConversionError>>::from_bound(
            "date",
            BoundArg::Absent,
        )
        .unwrap();
        assert!(optional.is_none());
    }

    #[test]
    fn test_contextual_parameters() {
        let context = Arc::new(Context::new("HELLO"));
        let arg = BoundArg::Value(SlotValue::Context(context.clone()));
        let owned = Context::from_bound("context", arg).unwrap();
        assert_eq!(owned.intent, "HELLO");

        let arg = BoundArg::Value(SlotValue::Session(Arc::new(Session::new("s"))));
        assert!(<Arc<Context>>::from_bound("context", arg).is_err());
    }

    #[test]
    fn test_rank_index() {
        assert_eq!(Rank(0).index(3), Some(0));
        assert_eq!(Rank(-1).index(3), Some(2));
        assert_eq!(Rank(-2).index(3), Some(1));
        assert_eq!(Rank(3).index(3), None);
        assert_eq!(Rank(-4).index(3), None);
    }

    #[test]
    fn test_bound_args_in_order() {
        let mut args = BoundArgs::new(vec![
            (Arc::from("a"), BoundArg::Value(SlotValue::Int(1))),
            (Arc::from("b"), BoundArg::Absent),
        ]);
        assert_eq!(args.take::<i64>().unwrap(), 1);
        assert_eq!(args.take::<Option<String>>().unwrap(), None);
        assert!(matches!(
            args.take::<i64>(),
            Err(InvokeError::ArgumentCount { .. })
        ));
    }
}
