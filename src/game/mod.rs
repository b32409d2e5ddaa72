pub mod policy;
pub mod rules;
pub mod types;
