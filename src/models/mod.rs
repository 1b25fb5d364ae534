// src/models/mod.rs

pub mod exam_session;
pub mod question;
pub mod result;
pub mod session_view;
