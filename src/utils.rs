pub mod password;
pub mod pricing;
pub mod prompt;
pub mod text;
pub mod token;
