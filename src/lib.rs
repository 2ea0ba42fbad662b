pub mod collection;
pub mod config;
pub mod constants;
pub mod core;
pub mod native;
pub mod report;

#[cfg(test)]
mod test_support;
