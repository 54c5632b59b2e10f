//! HTTP API handlers for mm-api

pub mod ale;
pub mod avb;
pub mod edl;
pub mod health;
pub mod mxf;
pub mod upload;
