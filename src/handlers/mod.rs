pub mod questions;
pub mod users;
