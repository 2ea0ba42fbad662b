pub mod process;
pub mod tester;
