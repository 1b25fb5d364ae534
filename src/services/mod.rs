// src/services/mod.rs

pub mod question_bank;
pub mod scoring;
pub mod session_store;
