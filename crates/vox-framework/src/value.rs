//! Values flowing through the binder: raw request data before conversion and
//! converted slot values after it.

use std::any::Any;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value;
use vox_core::{AttributeV2, Context, InvokeRequest, Session};

use crate::error::ConversionError;

// ============================================================================
// SlotValue
// ============================================================================

/// A converted parameter value.
///
/// Converters produce a `SlotValue`; typed handler parameters are projected
/// out of it by [`SlotType::from_slot`](crate::SlotType::from_slot).
#[derive(Debug, Clone)]
pub enum SlotValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    /// A JSON value passed through unconverted.
    Json(Value),
    List(Vec<SlotValue>),
    Attribute(Box<AttributeV2<SlotValue>>),
    /// The output of a custom converter.
    Custom(Arc<dyn Any + Send + Sync>),
    Context(Arc<Context>),
    Session(Arc<Session>),
    Request(Arc<InvokeRequest>),
}

impl SlotValue {
    /// Wraps an arbitrary value produced by a custom converter.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Json(_) => "json",
            Self::List(_) => "list",
            Self::Attribute(_) => "attribute",
            Self::Custom(_) => "custom",
            Self::Context(_) => "context",
            Self::Session(_) => "session",
            Self::Request(_) => "request",
        }
    }
}

macro_rules! impl_from_for_slot_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SlotValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_slot_value!(
    String => Text,
    bool => Bool,
    i64 => Int,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    TimeDelta => Duration,
    Value => Json,
    Vec<SlotValue> => List,
    Arc<Context> => Context,
    Arc<Session> => Session,
    Arc<InvokeRequest> => Request,
);

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<AttributeV2<SlotValue>> for SlotValue {
    fn from(value: AttributeV2<SlotValue>) -> Self {
        Self::Attribute(Box::new(value))
    }
}

// ============================================================================
// RawArg
// ============================================================================

/// Data extracted from a request for one parameter, before conversion.
#[derive(Debug, Clone)]
pub enum RawArg {
    /// Candidate values of a plain attribute.
    Values(Vec<Value>),
    /// Entries of a typed attribute.
    Attributes(Vec<AttributeV2<Value>>),
    Context(Arc<Context>),
    Session(Arc<Session>),
    Request(Arc<InvokeRequest>),
}

/// One element of a [`RawArg`] sequence.
#[derive(Debug, Clone, Copy)]
pub enum RawElement<'a> {
    Value(&'a Value),
    Attribute(&'a AttributeV2<Value>),
}

impl<'a> RawElement<'a> {
    /// The bare value, looking through an attribute wrapper.
    pub fn value(&self) -> &'a Value {
        match self {
            Self::Value(value) => value,
            Self::Attribute(attribute) => &attribute.value,
        }
    }
}

impl RawArg {
    /// Builds the raw data of a plain attribute.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(
            values
                .into_iter()
                .map(|value| Value::String(value.into()))
                .collect(),
        )
    }

    /// Number of sequence elements; contextual objects have none.
    pub fn len(&self) -> usize {
        match self {
            Self::Values(values) => values.len(),
            Self::Attributes(attributes) => attributes.len(),
            Self::Context(_) | Self::Session(_) | Self::Request(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element(&self, index: usize) -> Option<RawElement<'_>> {
        match self {
            Self::Values(values) => values.get(index).map(RawElement::Value),
            Self::Attributes(attributes) => attributes.get(index).map(RawElement::Attribute),
            Self::Context(_) | Self::Session(_) | Self::Request(_) => None,
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = RawElement<'_>> {
        (0..self.len()).filter_map(|index| self.element(index))
    }

    /// The contextual object itself, if this is one.
    pub fn contextual(&self) -> Option<SlotValue> {
        match self {
            Self::Context(context) => Some(SlotValue::Context(context.clone())),
            Self::Session(session) => Some(SlotValue::Session(session.clone())),
            Self::Request(request) => Some(SlotValue::Request(request.clone())),
            Self::Values(_) | Self::Attributes(_) => None,
        }
    }
}

// ============================================================================
// BoundArg
// ============================================================================

/// The outcome of binding one parameter.
#[derive(Debug, Clone)]
pub enum BoundArg {
    /// The request has no value for the parameter.
    Absent,
    Value(SlotValue),
    Failed(ConversionError),
}

impl BoundArg {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
