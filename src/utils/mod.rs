pub mod colors;
pub mod date;
pub mod id;
