//! Timetabling domain models.
//!
//! Provides the core data types for representing a semester's
//! timetabling problem and its solutions.
//!
//! # Domain Mappings
//!
//! | u-timetable | Scheduling analogue |
//! |-------------|---------------------|
//! | Session | Activity |
//! | Teacher, Room | Resource |
//! | StudentClass | Resource (group) |
//! | Solution | Schedule |
//! | TimeSlotCatalog | Calendar |

mod calendar;
mod constraint;
mod problem;
mod resource;
mod schedule;
mod session;

pub use calendar::{
    cells, Cell, DayPeriod, RestrictedWindow, SlotWindow, TimeBlock, TimeSlotCatalog,
    SLOTS_PER_DAY, TEACHING_WEEKDAYS,
};
pub use constraint::{
    ConstraintKind, ExclusivityDomain, HardConstraint, RelationConstraint, RelationKind,
    SoftConstraint,
};
pub use problem::TimetableProblem;
pub use resource::{PreferenceKind, Room, Teacher, TimePreference};
pub use schedule::{Assignment, ScheduleVersion, Solution, VersionStatus, Violation};
pub use session::{CourseNature, Offering, OfferingId, Session, SessionId, StudentClass};
