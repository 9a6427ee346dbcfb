//! Schema compiler for flowgen artifacts.
//!
//! A declared [`Schema`] of `{name, type}` fields is resolved through the
//! [`typemap`] table into representation types and coercions, then compiled
//! into record [`Contract`]s (with `to_map` / `from_map`) or positional
//! function [`Signature`]s.
//!
//! ```rust
//! use flowgen_core::{Contract, FieldSpec, FieldType, Schema};
//!
//! let schema = Schema::new(vec![FieldSpec::new("AnInputString", FieldType::String)]).unwrap();
//! let input = Contract::compile("Input", &schema);
//!
//! let mut record = input.new_record();
//! record.set("AnInputString", "Hello, World").unwrap();
//! let map = record.to_map();
//! assert_eq!(input.from_map(&map).unwrap(), record);
//! ```

pub mod coerce;
pub mod contract;
pub mod error;
pub mod render;
pub mod signature;
pub mod typemap;
pub mod types;
pub mod value;

pub use contract::{Contract, ContractField, Record};
pub use error::{CoercionError, ContractError, SchemaError};
pub use signature::{Parameter, Signature};
pub use typemap::{RepresentationType, TypeMapping, Usage};
pub use types::{ArgumentSpec, ArtifactKind, FieldSpec, FieldType, Schema};
pub use value::TypedValue;
