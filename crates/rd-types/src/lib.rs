pub mod market;
pub mod numeric;
pub mod portfolio;
pub mod errors;

pub use market::*;
pub use numeric::*;
pub use portfolio::*;
pub use errors::*;
