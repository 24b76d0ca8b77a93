// Library exports for testing

pub mod config;
pub mod models;
pub mod password;
pub mod seed;
pub mod storage;
