//! makex core: parse makefiles, plan builds, run recipes in parallel.
//!
//! ```text
//! parse(text) -> Makefile
//!   ↓ expand_globs()           (optional)
//! Plan::new(config, makefile, goals)
//!   ↓ BuildGraph               BFS closure + Kahn levels
//! Plan::levels_needing_build() existence / .PHONY filter
//!   ↓
//! Plan::run() | Plan::dry_run()
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod external;
pub mod fs;
pub mod graph;
pub mod makefile;
pub mod plan;
pub mod util;

pub use config::{Config, MakexConfig};
pub use error::{ExternalError, MakeError, ParseError, RecipeFailure};
pub use executor::{BuildSummary, Cancellation, LogSink};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use graph::BuildGraph;
pub use makefile::{expand_globs, marshal, parse, quote, Makefile, Rule};
pub use plan::Plan;
