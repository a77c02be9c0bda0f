mod load;
mod runtime;
mod types;

pub use load::{get_makex_data_dir, load_default, load_from_path};
pub use runtime::Config;
pub use types::{BuildConfig, LoggingConfig, MakexConfig};
