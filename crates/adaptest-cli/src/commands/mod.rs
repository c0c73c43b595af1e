pub mod generate_bank;
pub mod simulate;
pub mod targets;
pub mod validate;
