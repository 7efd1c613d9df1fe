pub mod add;
pub mod classes;
pub mod core;
pub mod import;
pub mod schools;
pub mod students;
