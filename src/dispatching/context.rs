//! Context for session priority rules.

use std::collections::HashMap;

use crate::models::{OfferingId, Session};

/// Aggregates the rules need beyond a single session.
#[derive(Debug, Clone, Default)]
pub struct PriorityContext {
    /// Total weekly units per offering (offering_id → units).
    pub offering_units: HashMap<OfferingId, u32>,
}

impl PriorityContext {
    /// Computes the aggregates over a session list.
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let mut offering_units: HashMap<OfferingId, u32> = HashMap::new();
        for s in sessions {
            *offering_units.entry(s.offering_id).or_default() += s.duration as u32;
        }
        Self { offering_units }
    }

    /// Overrides the weekly units of an offering.
    pub fn with_offering_units(mut self, offering_id: OfferingId, units: u32) -> Self {
        self.offering_units.insert(offering_id, units);
        self
    }

    /// Weekly units of an offering (0 if unknown).
    pub fn units_of(&self, offering_id: OfferingId) -> u32 {
        self.offering_units.get(&offering_id).copied().unwrap_or(0)
    }
}
