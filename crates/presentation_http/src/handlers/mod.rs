//! HTTP request handlers

pub mod catalog;
pub mod health;
pub mod quota;
pub mod stories;
