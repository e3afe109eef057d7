//! Entity model: scalar slot converters and the typed containers built on
//! top of them.

pub mod attribute;
pub mod convert;
pub mod time_range;
pub mod time_set;

pub use attribute::AttributeV2;
pub use convert::{
    DateTimeSource, DurationSource, on_off_to_boolean, rank, require_str, to_date, to_datetime,
    to_time, to_timedelta,
};
pub use time_range::{RangeItem, StepUnit, Steps, TimeRange};
pub use time_set::{Frequency, Limit, Occurrences, TimeSet};
