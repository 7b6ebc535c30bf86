//! Data-file loading for impact reactor block types and world rules.
//!
//! A data directory holds:
//!
//! - `reactors.{ron,toml,json}` (required): a list of block configs. In
//!   TOML the list lives under a top-level `reactors` array of tables.
//! - `rules.{ron,toml,json}` (optional): world rules. Missing fields and a
//!   missing file both fall back to defaults.
//!
//! Every block is validated while the registry is built.

pub mod loader;

pub use loader::{DataLoadError, ReactorData, load_reactor_data};
