//! Exposed scheduling operations and timetable KPIs.
//!
//! [`SchedulingService`] binds a store and a configuration and offers the
//! three operations callers use:
//!
//! - [`run`](SchedulingService::run): validate, search, store
//! - [`repair`](SchedulingService::repair): phased repair of the stored
//!   timetable
//! - [`report`](SchedulingService::report): [`ScheduleKpi`] of the stored
//!   timetable
//!
//! `run` and `repair` only write to draft versions.

mod kpi;
mod service;

pub use kpi::{EntityConflicts, ScheduleKpi};
pub use service::{RunReport, SchedulingService};
