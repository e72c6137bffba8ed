pub mod expense;
pub mod price;
pub mod transaction;

pub use expense::*;
pub use price::*;
pub use transaction::*;
