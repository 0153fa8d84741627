pub mod emails;
pub mod health;
pub mod root;
