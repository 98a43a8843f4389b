//! Multilingual legal-assistance chat relay.
//!
//! Authenticated users converse with a language model (directly or through a
//! workflow webhook); replies are persisted per conversation, new
//! conversations count against a monthly allowance, and premium users can
//! render guided legal documents to PDF.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
