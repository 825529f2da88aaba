pub mod runner;
pub mod step;
