pub mod common;
pub mod question;
pub mod survey;
