use chrono::{Datelike, NaiveDate};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::{AvailabilitySchedule, DayAvailability, TimeRange};

/// Resolves a clinician's bookable windows for one calendar date.
///
/// Resolution order: the fixed rest day always wins, then a date-specific
/// override (taken verbatim, disabled or not), then the weekly template,
/// then the clinic's default hours. Absence of data never fails; a
/// clinician who never configured availability is bookable by default hours.
pub struct AvailabilityResolver {
    config: AppConfig,
}

impl AvailabilityResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn resolve(
        &self,
        schedule: Option<&AvailabilitySchedule>,
        date: NaiveDate,
    ) -> DayAvailability {
        if date.weekday() == self.config.closed_weekday {
            debug!("{} falls on the rest day, clinic closed", date);
            return DayAvailability::closed();
        }

        if let Some(schedule) = schedule {
            if let Some(override_day) = schedule.overrides.get(&date) {
                debug!("date-specific override found for {}", date);
                return override_day.clone();
            }
            if let Some(template_day) = schedule.weekly.get(&date.weekday()) {
                return template_day.clone();
            }
        }

        DayAvailability::open(vec![TimeRange::new(
            self.config.default_open,
            self.config.default_close,
        )])
    }
}
