//! Converter resolution.
//!
//! A parameter's declared type describes its conversion as a
//! [`ConverterSpec`]. [`ConverterSpec::resolve`] turns that description into
//! a [`Converter`] once, at registration, so that invocation only calls the
//! precomputed function.
//!
//! ```text
//! NaiveDate                    → Scalar(Date)                       first value, to_date
//! Vec<NaiveDate>               → ListOf(Scalar(Date))               every value, to_date
//! AttributeV2<NaiveDate>       → AttributeWrapper(Scalar(Date))     first entry, AttributeV2 + to_date
//! Vec<AttributeV2<NaiveDate>>  → ListOf(AttributeWrapper(...))      every entry
//! Context / Session / Request  → PassThrough
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tower::BoxError;
use vox_core::{
    AttributeV2, EntityError, TimeRange, on_off_to_boolean, rank, require_str, to_date,
    to_datetime, to_time, to_timedelta,
};

use crate::error::{ConversionError, EmptySlot};
use crate::value::{RawArg, RawElement, SlotValue};

/// A resolved conversion from raw request data to a slot value.
pub type Converter = Arc<dyn Fn(&RawArg) -> Result<SlotValue, ConversionError> + Send + Sync>;

type ElementConverter =
    Arc<dyn Fn(RawElement<'_>) -> Result<SlotValue, ConversionError> + Send + Sync>;

type CustomFn = Arc<dyn Fn(&Value) -> Result<SlotValue, BoxError> + Send + Sync>;

// ============================================================================
// Scalar lookup table
// ============================================================================

/// The native slot types with a canonical converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Strings, converted by identity.
    Text,
    Bool,
    Date,
    Time,
    DateTime,
    Duration,
}

impl ScalarType {
    pub fn converter_name(&self) -> &'static str {
        match self {
            Self::Text => "identity",
            Self::Bool => "on_off_to_boolean",
            Self::Date => "to_date",
            Self::Time => "to_time",
            Self::DateTime => "to_datetime",
            Self::Duration => "to_timedelta",
        }
    }

    pub fn convert(&self, raw: &Value) -> Result<SlotValue, EntityError> {
        match self {
            Self::Text => Ok(match raw {
                Value::String(text) => SlotValue::Text(text.clone()),
                other => SlotValue::Json(other.clone()),
            }),
            Self::Bool => on_off_to_boolean(require_str(raw)?).map(SlotValue::Bool),
            Self::Date => to_date(require_str(raw)?).map(SlotValue::Date),
            Self::Time => to_time(require_str(raw)?).map(SlotValue::Time),
            Self::DateTime => to_datetime(require_str(raw)?).map(SlotValue::DateTime),
            Self::Duration => to_timedelta(require_str(raw)?).map(SlotValue::Duration),
        }
    }
}

// ============================================================================
// Custom converters
// ============================================================================

/// A named conversion function used directly as a parameter's converter.
#[derive(Clone)]
pub struct CustomConverter {
    name: Cow<'static, str>,
    func: CustomFn,
}

impl CustomConverter {
    pub fn new<F, T, E>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
        T: Into<SlotValue>,
        E: Into<BoxError>,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |raw: &Value| func(raw).map(Into::into).map_err(Into::into)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convert(&self, raw: &Value) -> Result<SlotValue, ConversionError> {
        (self.func)(raw).map_err(|e| ConversionError::new(self.name.clone(), raw.clone(), e))
    }

    /// Integers, from JSON numbers or decimal strings.
    pub fn integer() -> Self {
        Self::new("integer", |raw: &Value| -> Result<i64, BoxError> {
            match raw {
                Value::Number(number) => number
                    .as_i64()
                    .ok_or_else(|| format!("{number} is not an integer").into()),
                other => Ok(require_str(other)?.trim().parse::<i64>()?),
            }
        })
    }

    /// Ordinals, mapped by [`rank`].
    pub fn rank() -> Self {
        Self::new("rank", |raw: &Value| rank(require_str(raw)?))
    }

    /// `begin/end` intervals.
    pub fn time_range() -> Self {
        Self::new("time_range", |raw: &Value| -> Result<SlotValue, EntityError> {
            let range: TimeRange = require_str(raw)?.parse()?;
            Ok(SlotValue::custom(range))
        })
    }
}

impl fmt::Debug for CustomConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConverter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConverterSpec
// ============================================================================

/// How a parameter's raw value is converted.
#[derive(Debug, Clone)]
pub enum ConverterSpec {
    Scalar(ScalarType),
    Custom(CustomConverter),
    ListOf(Box<ConverterSpec>),
    AttributeWrapper(Box<ConverterSpec>),
    PassThrough,
}

impl ConverterSpec {
    pub fn list_of(inner: ConverterSpec) -> Self {
        Self::ListOf(Box::new(inner))
    }

    pub fn attribute(inner: ConverterSpec) -> Self {
        Self::AttributeWrapper(Box::new(inner))
    }

    /// A readable name such as `list[attribute[to_date]]`.
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.converter_name().to_string(),
            Self::Custom(custom) => custom.name().to_string(),
            Self::ListOf(inner) => format!("list[{}]", inner.name()),
            Self::AttributeWrapper(inner) => format!("attribute[{}]", inner.name()),
            Self::PassThrough => "identity".to_string(),
        }
    }

    /// Resolves the spec into a converter over a parameter's raw data.
    ///
    /// List specs convert every element in order and fail on the first
    /// element that fails. Every other spec converts only the first element,
    /// the remaining ones being alternative parses. Contextual objects are
    /// passed through unchanged.
    pub fn resolve(&self) -> Converter {
        match self {
            Self::ListOf(inner) => {
                let element = inner.element();
                Arc::new(move |raw: &RawArg| {
                    raw.elements()
                        .map(|item| element(item))
                        .collect::<Result<Vec<_>, _>>()
                        .map(SlotValue::List)
                })
            }
            Self::PassThrough => {
                let element = self.element();
                Arc::new(move |raw: &RawArg| match raw.contextual() {
                    Some(value) => Ok(value),
                    None => first(raw, "identity", &element),
                })
            }
            _ => {
                let name = self.name();
                let element = self.element();
                Arc::new(move |raw: &RawArg| first(raw, &name, &element))
            }
        }
    }

    /// Builds the converter for a single element.
    fn element(&self) -> ElementConverter {
        match self {
            Self::Scalar(scalar) => {
                let scalar = *scalar;
                Arc::new(move |item: RawElement<'_>| {
                    let raw = item.value();
                    scalar
                        .convert(raw)
                        .map_err(|e| ConversionError::new(scalar.converter_name(), raw.clone(), e))
                })
            }
            Self::Custom(custom) => {
                let custom = custom.clone();
                Arc::new(move |item: RawElement<'_>| custom.convert(item.value()))
            }
            Self::ListOf(inner) => {
                let element = inner.element();
                Arc::new(move |item: RawElement<'_>| match item.value() {
                    Value::Array(items) => items
                        .iter()
                        .map(|value| element(RawElement::Value(value)))
                        .collect::<Result<Vec<_>, _>>()
                        .map(SlotValue::List),
                    value => element(RawElement::Value(value)).map(|v| SlotValue::List(vec![v])),
                })
            }
            Self::AttributeWrapper(inner) => {
                let element = inner.element();
                Arc::new(move |item: RawElement<'_>| {
                    let attribute = match item {
                        RawElement::Attribute(attribute) => attribute.clone(),
                        RawElement::Value(value) => AttributeV2::from_value(value.clone())
                            .map_err(|e| ConversionError::new("AttributeV2", value.clone(), e))?,
                    };
                    attribute
                        .try_map(|value| element(RawElement::Value(&value)))
                        .map(SlotValue::from)
                })
            }
            Self::PassThrough => Arc::new(|item: RawElement<'_>| {
                Ok(match item {
                    RawElement::Value(value) => SlotValue::Json(value.clone()),
                    RawElement::Attribute(attribute) => {
                        SlotValue::from(attribute.clone().map(SlotValue::Json))
                    }
                })
            }),
        }
    }
}

fn first(
    raw: &RawArg,
    name: &str,
    element: &ElementConverter,
) -> Result<SlotValue, ConversionError> {
    match raw.element(0) {
        Some(item) => element(item),
        None => Err(ConversionError::new(name.to_string(), Value::Null, EmptySlot)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates() -> RawArg {
        RawArg::strings(["2001-12-31", "1001-12-31"])
    }

    #[test]
    fn test_scalar_takes_first_value() {
        let converter = ConverterSpec::Scalar(ScalarType::Date).resolve();
        let value = converter(&dates()).unwrap();
        assert!(matches!(value, SlotValue::Date(d) if d == date(2001, 12, 31)));
    }

    #[test]
    fn test_list_takes_every_value() {
        let converter = ConverterSpec::list_of(ConverterSpec::Scalar(ScalarType::Date)).resolve();
        let SlotValue::List(items) = converter(&dates()).unwrap() else {
            panic!("expected a list");
        };
        let items: Vec<_> = items
            .into_iter()
            .map(|item| match item {
                SlotValue::Date(d) => d,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(items, vec![date(2001, 12, 31), date(1001, 12, 31)]);
    }

    #[test]
    fn test_scalar_lookup_table() {
        let cases = [
            (ScalarType::Bool, json!("ON")),
            (ScalarType::Duration, json!("PT1H5M6S")),
            (ScalarType::DateTime, json!("2020-05-17T14:30:00")),
            (ScalarType::Time, json!("14:30")),
            (ScalarType::Text, json!("plain")),
        ];
        for (scalar, raw) in cases {
            assert!(scalar.convert(&raw).is_ok(), "{scalar:?}");
        }
        assert!(matches!(
            ScalarType::Duration.convert(&json!("PT1H5M6S")),
            Ok(SlotValue::Duration(d)) if d == TimeDelta::seconds(3906)
        ));
    }

    #[test]
    fn test_bool_rejects_non_strings() {
        assert!(matches!(
            ScalarType::Bool.convert(&json!(1)),
            Err(EntityError::ExpectedString { found: "number" })
        ));
    }

    #[test]
    fn test_failure_carries_converter_and_raw_value() {
        let converter = ConverterSpec::Scalar(ScalarType::Date).resolve();
        let error = converter(&RawArg::strings(["not a date"])).unwrap_err();

        assert_eq!(error.converter(), "to_date");
        assert_eq!(error.raw(), &json!("not a date"));
        assert_eq!(
            error.downcast_ref::<EntityError>(),
            Some(&EntityError::InvalidDateTime("not a date".to_string()))
        );
    }

    #[test]
    fn test_list_fails_on_first_bad_element() {
        let converter = ConverterSpec::list_of(ConverterSpec::Scalar(ScalarType::Date)).resolve();
        let error = converter(&RawArg::strings(["2001-12-31", "nope", "also bad"])).unwrap_err();
        assert_eq!(error.raw(), &json!("nope"));
    }

    #[test]
    fn test_attribute_wrapper_from_typed_entries() {
        let raw = RawArg::Attributes(vec![
            AttributeV2::<Value>::from_value(json!({"id": 1, "value": "123456", "nestedIn": [2]})).unwrap(),
        ]);
        let converter = ConverterSpec::attribute(ConverterSpec::Custom(CustomConverter::integer()))
            .resolve();

        let SlotValue::Attribute(attribute) = converter(&raw).unwrap() else {
            panic!("expected an attribute");
        };
        assert_eq!(attribute.id, 1);
        assert_eq!(attribute.nested_in, vec![2]);
        assert!(matches!(attribute.value, SlotValue::Int(123456)));
    }

    #[test]
    fn test_attribute_wrapper_from_plain_values() {
        let converter = ConverterSpec::attribute(ConverterSpec::Scalar(ScalarType::Text)).resolve();
        let SlotValue::Attribute(attribute) = converter(&RawArg::strings(["Berlin"])).unwrap()
        else {
            panic!("expected an attribute");
        };
        assert_eq!(attribute.id, 0);
        assert!(matches!(&attribute.value, SlotValue::Text(t) if t == "Berlin"));
    }

    #[test]
    fn test_attribute_mapping_failure_is_surfaced() {
        let raw = RawArg::Attributes(vec![AttributeV2::new(1, json!("soon"))]);
        let converter = ConverterSpec::attribute(ConverterSpec::Scalar(ScalarType::Date)).resolve();
        let error = converter(&raw).unwrap_err();
        assert_eq!(error.converter(), "to_date");
        assert_eq!(error.raw(), &json!("soon"));
    }

    #[test]
    fn test_pass_through_contextual() {
        let context = Arc::new(vox_core::Context::new("HELLO"));
        let converter = ConverterSpec::PassThrough.resolve();
        let value = converter(&RawArg::Context(context.clone())).unwrap();
        assert!(matches!(value, SlotValue::Context(c) if Arc::ptr_eq(&c, &context)));
    }

    #[test]
    fn test_custom_converters() {
        let rank = CustomConverter::rank();
        assert!(matches!(rank.convert(&json!("max")), Ok(SlotValue::Int(-1))));
        assert!(rank.convert(&json!("succ")).is_err());

        let integer = CustomConverter::integer();
        assert!(matches!(integer.convert(&json!(" 42 ")), Ok(SlotValue::Int(42))));
        assert!(matches!(integer.convert(&json!(7)), Ok(SlotValue::Int(7))));
        assert_eq!(integer.convert(&json!("x")).unwrap_err().converter(), "integer");

        let SlotValue::Custom(range) = CustomConverter::time_range()
            .convert(&json!("2020-01-01/2020-01-02"))
            .unwrap()
        else {
            panic!("expected a custom value");
        };
        assert!(range.downcast_ref::<TimeRange>().is_some());
    }

    #[test]
    fn test_empty_raw_value() {
        let converter = ConverterSpec::Scalar(ScalarType::Text).resolve();
        let error = converter(&RawArg::Values(Vec::new())).unwrap_err();
        assert!(error.downcast_ref::<EmptySlot>().is_some());
    }

    #[test]
    fn test_spec_names() {
        let spec = ConverterSpec::list_of(ConverterSpec::attribute(ConverterSpec::Scalar(
            ScalarType::Date,
        )));
        assert_eq!(spec.name(), "list[attribute[to_date]]");
    }
}
