pub mod api;
pub mod auth;
pub mod forms;
pub mod pages;
