// ============================================================================
// dataseed Library
// ============================================================================

//! Idempotent data migrations and cached property mapping.
//!
//! Two independent tools for seeding and fixing up data in a mapped context:
//!
//! - **Data migrations**: [`DataMigration`] units run in `order()` by a
//!   [`MigrationRunner`], which records each applied unit in a history store
//!   and skips it (calling its cleanup hook) on later runs.
//! - **Property mapping**: `#[derive(Mappable)]` generates the copy code;
//!   a [`MapperRegistry`] caches one copy function per type or type pair.
//!   [`SeedExt`] builds add-or-update on top of both.
//!
//! # Examples
//!
//! ```
//! use dataseed::{
//!     DataMigration, Mappable, MemoryContext, MigrationRunner, SeedExt, Value,
//! };
//!
//! #[derive(Mappable, Debug, Clone, Default)]
//! struct Country {
//!     #[mapping(key)]
//!     code: String,
//!     name: String,
//! }
//!
//! struct SeedCountries;
//!
//! impl DataMigration<MemoryContext> for SeedCountries {
//!     fn order(&self) -> i32 {
//!         1
//!     }
//!
//!     fn apply(&self, context: &mut MemoryContext) -> anyhow::Result<()> {
//!         let nz = Country { code: String::new(), name: "New Zealand".into() };
//!         context.add_or_update(nz, &[Value::from("NZ")])?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut context = MemoryContext::new();
//! context.register::<Country>()?;
//!
//! let runner = MigrationRunner::new("app::Configuration");
//! let migrations: Vec<Box<dyn DataMigration<MemoryContext>>> = vec![Box::new(SeedCountries)];
//! let report = runner.apply_all(&mut context, migrations)?;
//! assert_eq!(report.applied(), vec!["seedcountries"]);
//!
//! // A second run only calls the cleanup hook.
//! let migrations: Vec<Box<dyn DataMigration<MemoryContext>>> = vec![Box::new(SeedCountries)];
//! let report = runner.apply_all(&mut context, migrations)?;
//! assert_eq!(report.skipped(), vec!["seedcountries"]);
//! assert_eq!(context.rows::<Country>()?.len(), 1);
//! # Ok(())
//! # }
//! ```

extern crate self as dataseed;

pub mod config;
pub mod context;
pub mod core;
pub mod history;
pub mod mapping;
pub mod migration;
pub mod result;

pub use config::SeedConfig;
pub use context::{
    DataContext, EntitySet, MemoryContext, MemorySet, MigrationContext, ModelMetadata, RowId,
    SeedExt,
};
pub use crate::core::{DataType, Result, SeedError, Value};
pub use history::{HistoryRecord, HistoryStore, MemoryHistoryStore, SqlExecutor, SqlHistoryStore};
pub use mapping::{MapValue, Mappable, MapperRegistry, Property, map_dictionary, map_keys};
pub use migration::{
    DataMigration, MigrationConfiguration, MigrationEntry, MigrationOutcome, MigrationReport,
    MigrationRunner, MigrationSet,
};
pub use result::QueryResult;

pub use dataseed_derive::Mappable;
