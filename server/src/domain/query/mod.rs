//! Filter-to-query pipeline
//!
//! Data flows one way:
//! raw request -> [`validate`] -> [`compile`] (renders predicates through
//! [`filters`]) -> [`materialize`].
//!
//! Every value reaches the store as a bound parameter. Only identifiers that
//! passed schema validation are interpolated into statement text.

pub mod compile;
pub mod filters;
pub mod materialize;
pub mod request;
pub mod validate;

pub use compile::{CompiledQuery, QueryMode, compile};
pub use filters::{Filter, FilterOperator, SqlParams};
pub use materialize::{Materialized, Record, count, materialize};
pub use request::{RawRequest, Schema};
pub use validate::{OrderBy, OrderDirection, ValidatedQuery, ValidationError, validate};
