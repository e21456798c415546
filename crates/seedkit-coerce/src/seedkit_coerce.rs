//! Value coercion for seedkit
//!
//! Fixture rows arrive loosely typed: numbers as decimal text, nullable
//! references, nested arrays and objects. Before a row can be handed to an
//! [`Inserter`](seedkit_core::Inserter) every value is converted into the
//! exact [`NativeValue`](seedkit_core::NativeValue) its column expects.
//!
//! Dispatch is over the closed [`ColumnKind`](seedkit_core::ColumnKind) enum,
//! with one conversion per kind and recursion for arrays.

mod coerce;
mod error;
mod row;

#[cfg(test)]
mod tests;

pub use coerce::{coerce, coerce_str};
pub use error::CoercionError;
pub use row::{coerce_row, coerce_rows};
