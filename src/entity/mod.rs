pub mod area;
pub mod prefecture;
pub mod region;
pub mod weather;
