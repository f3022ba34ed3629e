pub mod errors;
pub mod models;
pub mod roles;
pub mod services;
pub mod view;
