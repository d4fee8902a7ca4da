pub mod reading;
pub mod time_range;
