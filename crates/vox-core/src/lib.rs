//! # Vox Core
//!
//! Data types shared by every layer of the Vox skill SDK.
//!
//! - **Requests and responses**: [`InvokeRequest`], [`Context`], [`Session`]
//!   and [`Response`], the JSON envelopes exchanged with the voice platform.
//! - **Entity model**: converters from raw slot strings into native values
//!   ([`to_date`], [`to_timedelta`], [`on_off_to_boolean`], [`rank`], ...) and
//!   the typed containers [`AttributeV2`], [`TimeRange`] and [`TimeSet`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use vox_core::{AttributeV2, TimeRange, to_date};
//!
//! let date = to_date("2001-12-31")?;
//! let range: TimeRange = "2020-01-01T10:00/2020-01-01T18:00".parse()?;
//! assert!(range.contains(&date) == false);
//! ```

pub mod entity;
pub mod error;
pub mod request;
pub mod response;

pub use entity::{
    AttributeV2, DateTimeSource, DurationSource, Frequency, Limit, Occurrences, RangeItem,
    StepUnit, Steps, TimeRange, TimeSet, on_off_to_boolean, rank, require_str, to_date,
    to_datetime, to_time, to_timedelta,
};
pub use error::{EntityError, EntityResult, json_type_name};
pub use request::{Context, InvokeRequest, Session};
pub use response::{Response, ResponseType};

pub use chrono;
