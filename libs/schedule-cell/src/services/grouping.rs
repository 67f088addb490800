// libs/schedule-cell/src/services/grouping.rs
use std::collections::HashMap;

use uuid::Uuid;

use crate::error::ScheduleError;
use crate::models::{SlotGroup, TokenSlot};

/// Partition a flat, unordered slot list into availability groups.
///
/// Groups are keyed by band identity. Within a group slots are ordered by
/// start time ascending; groups are ordered by their first slot's start
/// time ascending. Both sorts are stable, so equal start times keep the
/// original input order. Each group carries the summed remaining capacity
/// of its slots, for display only.
///
/// A slot with a malformed availability reference fails the whole call:
/// dropping it silently would corrupt the capacity accounting downstream.
pub fn group_slots(slots: Vec<TokenSlot>) -> Result<Vec<SlotGroup>, ScheduleError> {
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let mut band_order: Vec<Uuid> = Vec::new();
    let mut buckets: HashMap<Uuid, SlotGroup> = HashMap::new();

    for slot in slots {
        if slot.availability.id.is_nil() || slot.availability.name.trim().is_empty() {
            return Err(ScheduleError::MalformedAvailability { slot_id: slot.id });
        }

        let band_id = slot.availability.id;
        let group = buckets.entry(band_id).or_insert_with(|| {
            band_order.push(band_id);
            SlotGroup {
                availability: slot.availability.clone(),
                slots: Vec::new(),
                remaining_capacity: 0,
            }
        });
        group.slots.push(slot);
    }

    // First-seen band order is the tie-break for groups with equal start.
    let mut groups: Vec<SlotGroup> = band_order
        .into_iter()
        .filter_map(|band_id| buckets.remove(&band_id))
        .collect();

    for group in &mut groups {
        group.slots.sort_by_key(|slot| slot.start_time);
        group.remaining_capacity = group.slots.iter().map(TokenSlot::remaining).sum();
    }

    // Groups are non-empty by construction.
    groups.sort_by_key(|group| group.slots[0].start_time);

    Ok(groups)
}
