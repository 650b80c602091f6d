//! Household domain model.
//!
//! # Responsibility
//! - Define the member/task entities shared by repository, controller and
//!   scheduler.
//! - Keep status transitions (`is_done` / `completed_at`) in one place.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - A task is owned by exactly one member.

pub mod advice;
pub mod member;
pub mod reminder;
pub mod task;
