//! One entry point per CLI command.
//!
//! Each command loads the [`config::Config`], builds the directory client and
//! hands the work to the application layer. Output goes to stdout.

pub mod config;

mod add;
mod export;
mod import;
mod search;
mod tag;
mod tags;
mod untrack;
mod versions;

pub use add::add;
pub use export::export;
pub use import::import;
pub use search::search;
pub use tag::tag;
pub use tags::tags;
pub use untrack::untrack;
pub use versions::versions;

pub use config::{Config, ConfigOptions};
