pub mod builder;
pub mod client;
pub mod demo;
pub mod describe;
pub mod error;
pub mod events;
pub mod model;
pub mod panels;
pub mod paths;
pub mod settings;
pub mod state;
pub mod storage;
