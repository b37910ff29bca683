pub mod initializer;
pub mod worker;
