// src/models/mod.rs

pub mod draft;
pub mod feedback;
pub mod question;
pub mod session;
pub mod student;
pub mod teacher;
