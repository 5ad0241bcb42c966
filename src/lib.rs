pub mod anchor;
pub mod caption;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod patcher;
pub mod resolver;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{PatchConfig, load_config};
pub use patcher::{PatchError, PatchOutcome, PatchStats, SvgPatcher};
pub use resolver::{RefResolver, RefTarget, TableResolver};
