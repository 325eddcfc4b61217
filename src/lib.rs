pub mod account;
pub mod app;
pub mod config;
pub mod filter;
pub mod models;
pub mod navigation;
pub mod screens;
pub mod tmdb;
