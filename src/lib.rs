//! University course timetabling.
//!
//! Places a term's teaching sessions onto (teacher, room, weekday, block)
//! tuples under hard feasibility rules and soft quality preferences, then
//! repairs stored timetables in ordered phases.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Session`, `Offering`, `Teacher`, `Room`,
//!   `Assignment`, `Solution`, `ScheduleVersion`, and the time-slot catalog
//! - **`context`**: Read-only per-run lookup tables in priority order
//! - **`evaluation`**: Hard and soft constraint evaluation, lexicographic fitness
//! - **`dispatching`**: Session prioritization rules
//! - **`ga`**: Genetic search building a first full timetable
//! - **`repair`**: Phased post-hoc conflict repair
//! - **`store`**: Persistence gateway (in-memory and JSON file)
//! - **`scheduler`**: Run / repair / report operations and KPIs
//! - **`validation`**: Input integrity checks
//!
//! # Architecture
//!
//! Search and repair share one constraint model and one assignment
//! representation. Reference data is loaded once into a
//! [`context::ProblemContext`] and never mutated during a run.
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Schaerf (1999), "A survey of automated timetabling"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

pub mod config;
pub mod context;
pub mod dispatching;
pub mod error;
pub mod evaluation;
pub mod ga;
pub mod logger;
pub mod models;
pub mod repair;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
