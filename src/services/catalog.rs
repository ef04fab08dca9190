use chrono::NaiveTime;

use crate::models::{FacilityType, Slot, SlotParseError};

/// The fixed daily windows offered for each facility type. Configured at
/// startup and never derived from facility data.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCatalog {
    ground: Vec<Slot>,
    net: Vec<Slot>,
}

impl Default for SlotCatalog {
    fn default() -> Self {
        let hourly = hourly_slots(6, 21);
        Self {
            ground: hourly.clone(),
            net: hourly,
        }
    }
}

impl SlotCatalog {
    pub fn new(mut ground: Vec<Slot>, mut net: Vec<Slot>) -> Self {
        for slots in [&mut ground, &mut net] {
            slots.sort();
            slots.dedup();
        }
        Self { ground, net }
    }

    /// Builds a catalog from comma-separated `HH:MM-HH:MM` lists. A missing
    /// list falls back to the default hourly catalog for that type.
    pub fn from_lists(ground: Option<&str>, net: Option<&str>) -> Result<Self, SlotParseError> {
        let defaults = Self::default();
        let ground = match ground {
            Some(list) => parse_list(list)?,
            None => defaults.ground,
        };
        let net = match net {
            Some(list) => parse_list(list)?,
            None => defaults.net,
        };
        Ok(Self::new(ground, net))
    }

    pub fn all_slots(&self, facility_type: FacilityType) -> &[Slot] {
        match facility_type {
            FacilityType::Ground => &self.ground,
            FacilityType::Net => &self.net,
        }
    }

    pub fn contains(&self, facility_type: FacilityType, slot: &Slot) -> bool {
        self.all_slots(facility_type).binary_search(slot).is_ok()
    }
}

/// Contiguous one-hour windows from `open_hour` until `close_hour`.
pub fn hourly_slots(open_hour: u32, close_hour: u32) -> Vec<Slot> {
    (open_hour..close_hour)
        .filter_map(|h| {
            let start = NaiveTime::from_hms_opt(h, 0, 0)?;
            let end = NaiveTime::from_hms_opt(h + 1, 0, 0)?;
            Slot::new(start, end).ok()
        })
        .collect()
}

fn parse_list(list: &str) -> Result<Vec<Slot>, SlotParseError> {
    let slots = list
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(Slot::parse_label)
        .collect::<Result<Vec<_>, _>>()?;
    if slots.is_empty() {
        return Err(SlotParseError::InvalidLabel(list.to_string()));
    }
    Ok(slots)
}
