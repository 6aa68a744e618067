//! Main module for cogsl library functionality

pub mod config;
pub mod lexing;
pub mod testing;
pub mod token;
