pub mod image;
pub mod question;
pub mod survey;
