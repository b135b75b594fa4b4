pub mod errors;
pub mod timestamp;

pub use errors::ChartError;
pub use timestamp::parse_db_timestamp;
