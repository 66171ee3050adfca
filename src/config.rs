//! Algorithm, penalty-weight and repair configuration.
//!
//! All types deserialize with defaults for missing fields, so a partial
//! JSON file only overrides what it names:
//!
//! ```json
//! { "ga": { "population_size": 60, "seed": 7 }, "weights": { "weekend": 2000 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{HardConstraint, SoftConstraint};

/// Genetic search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation budget.
    pub generations: usize,
    /// Probability that a selected pair is recombined.
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
    /// Best individuals carried over unchanged.
    pub elitism_size: usize,
    /// Generations without improvement before stopping.
    pub max_stagnation: usize,
    /// Sampling attempts per session when building an individual.
    pub placement_attempts: usize,
    /// Alternative placements tried by smart repair.
    pub repair_attempts: usize,
    /// Alternative placements tried when the gene has a class collision.
    pub class_repair_attempts: usize,
    /// Class collisions handled by the final post-processing pass.
    pub post_process_limit: usize,
    /// Random seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            tournament_size: 5,
            elitism_size: 10,
            max_stagnation: 50,
            placement_attempts: 300,
            repair_attempts: 50,
            class_repair_attempts: 80,
            post_process_limit: 20,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, n: usize) -> Self {
        self.tournament_size = n;
        self
    }

    /// Sets the elite count.
    pub fn with_elitism_size(mut self, n: usize) -> Self {
        self.elitism_size = n;
        self
    }

    /// Sets the stagnation limit.
    pub fn with_max_stagnation(mut self, n: usize) -> Self {
        self.max_stagnation = n;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks every parameter against its accepted range.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] naming the first out-of-range parameter.
    pub fn validate(&self) -> Result<()> {
        check_range("population_size", self.population_size, 10, 500)?;
        check_range("generations", self.generations, 10, 1000)?;
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        check_range("tournament_size", self.tournament_size, 2, 20)?;
        check_range("elitism_size", self.elitism_size, 1, 50)?;
        check_range("max_stagnation", self.max_stagnation, 10, 200)?;
        if self.elitism_size >= self.population_size {
            return Err(Error::InvalidConfig(format!(
                "elitism_size ({}) must be smaller than population_size ({})",
                self.elitism_size, self.population_size
            )));
        }
        if self.placement_attempts == 0 {
            return Err(Error::InvalidConfig(
                "placement_attempts must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} = {value} is outside {min}..={max}"
        )))
    }
}

fn check_rate(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} = {value} is outside [0, 1]"
        )))
    }
}

/// Penalty weight per constraint kind.
///
/// Hard weights are in the millions; the fitness comparison is also
/// lexicographic on (hard, soft), so a hard violation always dominates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    pub class_conflict: f64,
    pub teacher_conflict: f64,
    pub room_conflict: f64,
    pub capacity_exceeded: f64,
    pub missing_feature: f64,
    pub teacher_blackout: f64,
    pub restricted_window: f64,
    pub multi_campus_day: f64,

    /// Unused preferred window (charged once per preference).
    pub preference_unmet: f64,
    /// Back-to-back room change of a teacher.
    pub teacher_room_change: f64,
    /// Back-to-back room change of a class.
    pub class_room_change: f64,
    /// Scale of the utilization curve.
    pub utilization: f64,
    /// Per unit above [`PenaltyWeights::daily_unit_limit`].
    pub daily_overload: f64,
    /// Units per class and day before overload is charged.
    pub daily_unit_limit: u32,
    /// Violated relation whose own penalty is zero.
    pub relation: f64,
    /// General or required session in the evening.
    pub mandatory_evening: f64,
    /// General or required session at the weekend.
    pub mandatory_weekend: f64,
    /// Any session at the weekend.
    pub weekend: f64,
    /// Elective in prime daytime.
    pub elective_prime_time: f64,

    /// Hard penalty above which soft evaluation is skipped.
    pub infeasible_threshold: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            class_conflict: 800_000.0,
            teacher_conflict: 500_000.0,
            room_conflict: 500_000.0,
            capacity_exceeded: 600_000.0,
            missing_feature: 300_000.0,
            teacher_blackout: 300_000.0,
            restricted_window: 300_000.0,
            multi_campus_day: 200_000.0,

            preference_unmet: 100.0,
            teacher_room_change: 300.0,
            class_room_change: 240.0,
            utilization: 200.0,
            daily_overload: 150.0,
            daily_unit_limit: 8,
            relation: 300.0,
            mandatory_evening: 400.0,
            mandatory_weekend: 300.0,
            weekend: 1000.0,
            elective_prime_time: 30.0,

            infeasible_threshold: 5_000_000.0,
        }
    }
}

impl PenaltyWeights {
    /// Weight of one hard violation.
    pub fn hard(&self, kind: HardConstraint) -> f64 {
        match kind {
            HardConstraint::TeacherConflict => self.teacher_conflict,
            HardConstraint::ClassConflict => self.class_conflict,
            HardConstraint::RoomConflict => self.room_conflict,
            HardConstraint::CapacityExceeded => self.capacity_exceeded,
            HardConstraint::MissingFeature => self.missing_feature,
            HardConstraint::RestrictedWindow => self.restricted_window,
            HardConstraint::TeacherBlackout => self.teacher_blackout,
            HardConstraint::MultiCampusDay => self.multi_campus_day,
        }
    }

    /// Base weight of a soft constraint. Preference and relation penalties
    /// usually come from the record itself; this is the fallback.
    pub fn soft(&self, kind: SoftConstraint) -> f64 {
        match kind {
            SoftConstraint::AvoidedWindow | SoftConstraint::PreferredWindowUnmet => {
                self.preference_unmet
            }
            SoftConstraint::TeacherRoomChange => self.teacher_room_change,
            SoftConstraint::ClassRoomChange => self.class_room_change,
            SoftConstraint::RoomUtilization => self.utilization,
            SoftConstraint::DailyOverload => self.daily_overload,
            SoftConstraint::Weekend => self.weekend,
            SoftConstraint::MandatoryOffHours => self.mandatory_evening,
            SoftConstraint::ElectivePrimeTime => self.elective_prime_time,
            SoftConstraint::Relation => self.relation,
        }
    }

    /// Hard weights and the threshold must be positive; soft weights must
    /// not be negative.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] naming the offending weight.
    pub fn validate(&self) -> Result<()> {
        for kind in HardConstraint::ALL {
            if self.hard(kind) <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "weight for {kind} must be positive"
                )));
            }
        }
        let soft = [
            ("preference_unmet", self.preference_unmet),
            ("teacher_room_change", self.teacher_room_change),
            ("class_room_change", self.class_room_change),
            ("utilization", self.utilization),
            ("daily_overload", self.daily_overload),
            ("relation", self.relation),
            ("mandatory_evening", self.mandatory_evening),
            ("mandatory_weekend", self.mandatory_weekend),
            ("weekend", self.weekend),
            ("elective_prime_time", self.elective_prime_time),
        ];
        for (name, w) in soft {
            if w < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must not be negative")));
            }
        }
        if self.infeasible_threshold <= 0.0 {
            return Err(Error::InvalidConfig(
                "infeasible_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Post-hoc repair parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Minimum decrease of the distance to the ideal utilization band
    /// before a room swap is accepted.
    pub min_utilization_gain: f64,
    /// Unmet preferred windows handled per repair run.
    pub preference_limit: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            min_utilization_gain: 0.10,
            preference_limit: 10,
        }
    }
}

/// Complete solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub ga: GaConfig,
    pub weights: PenaltyWeights,
    pub repair: RepairConfig,
}

impl SolverConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    /// I/O and JSON errors, or [`Error::InvalidConfig`] when the values fail
    /// validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<()> {
        self.ga.validate()?;
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ga.population_size, 100);
        assert_eq!(config.ga.elitism_size, 10);
        assert!((config.repair.min_utilization_gain - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_ga_ranges() {
        assert!(GaConfig::default().with_population_size(5).validate().is_err());
        assert!(GaConfig::default().with_generations(2000).validate().is_err());
        assert!(GaConfig::default().with_mutation_rate(1.5).validate().is_err());
        assert!(GaConfig::default().with_tournament_size(1).validate().is_err());
        assert!(GaConfig::default().with_max_stagnation(5).validate().is_err());
        let elite_too_big = GaConfig::default()
            .with_population_size(20)
            .with_elitism_size(20);
        assert!(matches!(
            elite_too_big.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hard_weight_dominates_soft() {
        let w = PenaltyWeights::default();
        let smallest_hard = HardConstraint::ALL
            .iter()
            .map(|&k| w.hard(k))
            .fold(f64::INFINITY, f64::min);
        assert!(smallest_hard > w.weekend * 100.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "ga": { "population_size": 60, "seed": 7 }, "weights": { "weekend": 2000 } }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ga.population_size, 60);
        assert_eq!(config.ga.seed, Some(7));
        assert_eq!(config.ga.generations, 200);
        assert!((config.weights.weekend - 2000.0).abs() < 1e-12);
        assert!((config.weights.class_conflict - 800_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "u-timetable-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{ "repair": { "preference_limit": 3 } }"#).unwrap();
        let config = SolverConfig::from_json_file(&path).unwrap();
        assert_eq!(config.repair.preference_limit, 3);
        fs::remove_file(&path).unwrap();

        assert!(SolverConfig::from_json_file(&path).is_err());
    }
}
