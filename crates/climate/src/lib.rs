pub mod dates;
pub mod db;
pub mod query;
pub mod routes;
pub mod startup;
pub mod utils;

pub use dates::{format_date, parse_date};
pub use db::*;
pub use query::*;
pub use routes::*;
pub use startup::*;
pub use utils::*;
