pub mod checking;
pub mod formatting;
