use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// One bookable window within a day. An `end` earlier than `start` means the
/// window runs past midnight into the next day; equal `start` and `end` is a
/// zero-width window holding no bookable time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Whether a clinician works on a given day, and during which windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAvailability {
    pub enabled: bool,
    pub ranges: Vec<TimeRange>,
}

impl DayAvailability {
    pub fn closed() -> Self {
        Self {
            enabled: false,
            ranges: Vec::new(),
        }
    }

    pub fn open(ranges: Vec<TimeRange>) -> Self {
        Self {
            enabled: true,
            ranges,
        }
    }
}

/// A clinician's working hours: a weekly template plus date-specific
/// overrides, the overrides always winning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySchedule {
    pub clinician_id: Uuid,
    #[serde(with = "weekday_map")]
    pub weekly: HashMap<Weekday, DayAvailability>,
    pub overrides: BTreeMap<NaiveDate, DayAvailability>,
}

impl AvailabilitySchedule {
    pub fn new(clinician_id: Uuid) -> Self {
        Self {
            clinician_id,
            weekly: HashMap::new(),
            overrides: BTreeMap::new(),
        }
    }
}

/// A fixed-width bookable time unit with the number of patients already
/// occupying it. The count is informational, not a capacity gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub time: NaiveTime,
    pub occupant_count: u32,
}

/// The weekly template is serialized keyed by the day's number
/// (0 = Monday .. 6 = Sunday).
mod weekday_map {
    use super::*;
    use chrono::Weekday;
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &HashMap<Weekday, DayAvailability>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<_> = map
            .iter()
            .map(|(day, avail)| (day.num_days_from_monday(), avail))
            .collect();
        entries.sort_by_key(|(num, _)| *num);
        let mut out = ser.serialize_map(Some(entries.len()))?;
        for (num, avail) in entries {
            out.serialize_entry(&num, avail)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<HashMap<Weekday, DayAvailability>, D::Error> {
        let raw: BTreeMap<u8, DayAvailability> = serde::Deserialize::deserialize(de)?;
        let mut map = HashMap::new();
        for (num, avail) in raw {
            let day = match num {
                0 => Weekday::Mon,
                1 => Weekday::Tue,
                2 => Weekday::Wed,
                3 => Weekday::Thu,
                4 => Weekday::Fri,
                5 => Weekday::Sat,
                6 => Weekday::Sun,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid weekday number: {}",
                        other
                    )))
                }
            };
            map.insert(day, avail);
        }
        Ok(map)
    }
}
