//! Core use-case services.
//!
//! # Responsibility
//! - Compose record repositories into the household repository contract.
//! - Host the state controller actor and the reminder scheduler loop.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod home_controller;
pub mod home_repository;
pub mod members_feed;
pub mod reminder_scheduler;
