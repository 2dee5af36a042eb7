pub mod check_in;
pub mod segments;
pub mod startup;
pub mod tasks;
