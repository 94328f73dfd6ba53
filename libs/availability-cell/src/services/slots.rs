use chrono::{NaiveTime, Timelike};
use tracing::debug;

use shared_models::{Appointment, DayAvailability, Slot};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Expands availability ranges into fixed-width slots and annotates each
/// with the number of appointments already occupying it.
///
/// Slots are not exclusive: group sessions mean several patients can share
/// one slot, so occupancy is reported but never used to drop a slot. The
/// caller decides whether to warn.
pub struct SlotGenerator {
    slot_width_minutes: i32,
}

impl SlotGenerator {
    pub fn new(slot_width_minutes: i32) -> Self {
        Self {
            slot_width_minutes: slot_width_minutes.max(1),
        }
    }

    pub fn generate(&self, day: &DayAvailability, existing: &[Appointment]) -> Vec<Slot> {
        if !day.enabled || day.ranges.is_empty() {
            return Vec::new();
        }

        let width = self.slot_width_minutes as i64;
        let mut starts: Vec<i64> = Vec::new();

        for range in &day.ranges {
            // Zero-width windows hold no bookable time.
            if range.is_empty() {
                continue;
            }
            let start = minute_of_day(range.start);
            let end = minute_of_day(range.end);
            let span = if range.is_overnight() {
                end + MINUTES_PER_DAY - start
            } else {
                end - start
            };

            let mut offset = 0;
            while offset < span {
                starts.push((start + offset) % MINUTES_PER_DAY);
                offset += width;
            }
        }

        starts.sort_unstable();
        starts.dedup();

        let slots = starts
            .into_iter()
            .map(|minute| {
                let occupant_count = existing
                    .iter()
                    .filter(|appointment| self.occupies(appointment, minute))
                    .count() as u32;
                Slot {
                    time: from_minute_of_day(minute),
                    occupant_count,
                }
            })
            .collect::<Vec<_>>();

        debug!("generated {} slots", slots.len());
        slots
    }

    /// Half-open overlap between the slot window and the appointment's
    /// booked interval. A booking spanning several slot widths marks each
    /// slot it touches.
    fn occupies(&self, appointment: &Appointment, slot_start: i64) -> bool {
        let Some(time) = appointment.time else {
            return false;
        };
        let booked_start = minute_of_day(time);
        let booked_end = booked_start + appointment.duration_minutes.max(0) as i64;
        let slot_end = slot_start + self.slot_width_minutes as i64;
        slot_start < booked_end && booked_start < slot_end
    }
}

fn minute_of_day(time: NaiveTime) -> i64 {
    (time.hour() * 60 + time.minute()) as i64
}

fn from_minute_of_day(minute: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((minute / 60) as u32, (minute % 60) as u32, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}
