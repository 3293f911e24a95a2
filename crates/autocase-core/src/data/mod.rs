//! # Autocase Core Test Data
//!
//! Named data sets that test steps reference with `${set.item}`
//! placeholders.
//!
//! - [`DataStore`]: CRUD over [`DataSet`]s and [`DataItem`]s, name indexes,
//!   JSON import/export.
//! - [`ReferenceResolver`]: substitutes placeholders, leaving anything it
//!   cannot resolve verbatim and reporting it.
pub mod error;
pub mod io;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::{DataStoreError, UnresolvedReason};
pub use model::{DataItem, DataItemId, DataSet, DataSetId, ProjectId};
pub use resolver::{ReferenceResolver, Resolution, UnresolvedReference};
pub use store::DataStore;

#[cfg(test)]
mod tests;
