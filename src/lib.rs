pub mod api;
pub mod assignment;
pub mod cache;
pub mod checklist;
pub mod config;
pub mod export;
pub mod http;
pub mod models;
pub mod notification;
pub mod result;
pub mod schedule;
pub mod session;
pub mod status;
pub mod step;
pub mod store;
pub mod time;
pub mod unit;
pub mod view;
