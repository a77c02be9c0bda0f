#[allow(clippy::module_inception)]
pub mod error;
pub mod external;
pub mod parse;

pub use error::{MakeError, RecipeFailure};
pub use external::ExternalError;
pub use parse::ParseError;
