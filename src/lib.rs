//! JMA Forecast - area catalog and weather forecast API for the Japan Meteorological Agency
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod forecast;
pub mod hierarchy;
pub mod jma;
pub mod routes;
pub mod services;
pub mod session;
pub mod sync;
pub mod weather_code;
