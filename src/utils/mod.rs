// src/utils/mod.rs

pub mod data_url;
