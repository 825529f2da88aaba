pub mod params;
pub mod row;
pub mod source;
pub mod utils;
