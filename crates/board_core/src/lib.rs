pub mod board_api;
pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod session;
pub mod storage;
pub mod view;
