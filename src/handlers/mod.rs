// src/handlers/mod.rs

pub mod catalog;
pub mod session;
