//! The scenario sequence builder: an ordered list of editable rows that is
//! loaded from a stored scenario map and serialized back into one on save.

pub mod row;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::AppError;
use crate::model::{Inventory, ScenarioMap, StepRecord};

pub use row::{
    device_options, fields_for, BuilderRow, CommandOption, DeviceChoice, DeviceOption,
    FieldDescriptor, ParamField,
};

/// Stable identity of a row within its builder. Survives reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct RowId(pub u64);

#[derive(Debug, Clone, Default)]
pub struct SequenceBuilder {
    rows: Vec<BuilderRow>,
    next_id: u64,
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, pre-populated from `seed` when given. Returns false when
    /// the seed's device or command could not be matched; the row is still
    /// added, flagged invalid.
    pub fn add_row(&mut self, inventory: &Inventory, seed: Option<&StepRecord>) -> bool {
        self.next_id += 1;
        let (row, matched) = BuilderRow::new(RowId(self.next_id), inventory, seed);
        self.rows.push(row);
        matched
    }

    /// Replace the rows with the steps of a stored scenario. Returns the
    /// positions of rows that failed to match.
    pub fn load(&mut self, inventory: &Inventory, map: &ScenarioMap) -> Vec<usize> {
        self.rows.clear();
        map.records()
            .iter()
            .enumerate()
            .filter_map(|(pos, record)| (!self.add_row(inventory, Some(record))).then_some(pos))
            .collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[BuilderRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&BuilderRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    // ── Reordering ──────────────────────────────────────────────────

    pub fn remove_row(&mut self, id: RowId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.rows.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Swap a row with the one above it. The first row stays put.
    pub fn move_up(&mut self, id: RowId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => {
                self.rows.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap a row with the one below it. The last row stays put.
    pub fn move_down(&mut self, id: RowId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.rows.len() => {
                self.rows.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    // ── Row edits ───────────────────────────────────────────────────

    pub fn select_device(&mut self, inventory: &Inventory, id: RowId, index: usize) -> Result<(), AppError> {
        self.row_mut(id)?.select_device(inventory, index)
    }

    pub fn select_command(&mut self, inventory: &Inventory, id: RowId, index: usize) -> Result<(), AppError> {
        self.row_mut(id)?.select_command(inventory, index)
    }

    pub fn set_param(&mut self, id: RowId, name: &str, value: &str) -> Result<(), AppError> {
        self.row_mut(id)?.set_param(name, value)
    }

    /// The rows in display order as a dense scenario map.
    pub fn serialize(&self) -> ScenarioMap {
        ScenarioMap::new(self.rows.iter().map(BuilderRow::to_record).collect())
    }

    fn row_mut(&mut self, id: RowId) -> Result<&mut BuilderRow, AppError> {
        self.rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound {
                what: format!("Row {}", id.0),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::model::{DeviceId, Step};

    fn ids(builder: &SequenceBuilder) -> Vec<RowId> {
        builder.rows().iter().map(|r| r.id).collect()
    }

    fn three_rows(inv: &Inventory) -> SequenceBuilder {
        let mut b = SequenceBuilder::new();
        for _ in 0..3 {
            b.add_row(inv, None);
        }
        b
    }

    #[test]
    fn round_trip_is_stable() {
        let inv = demo::demo_inventory();
        let map = demo::good_night_steps();
        let mut b = SequenceBuilder::new();
        assert!(b.load(&inv, &map).is_empty());
        let first = b.serialize();
        assert_eq!(first, map);

        let mut again = SequenceBuilder::new();
        again.load(&inv, &first);
        assert_eq!(again.serialize(), first);
    }

    #[test]
    fn pause_rows_never_carry_a_device() {
        let inv = demo::demo_inventory();
        let mut b = SequenceBuilder::new();
        b.add_row(&inv, None);
        let id = b.rows()[0].id;
        let pause = b.rows()[0].devices().len() - 1;
        b.select_device(&inv, id, pause).unwrap();
        b.set_param(id, "delay", "5").unwrap();

        let map = b.serialize();
        let record = &map.records()[0];
        assert_eq!(record.uuid, None);
        assert!(record.is_pause());
    }

    #[test]
    fn interior_move_up_then_down_restores_order() {
        let inv = demo::demo_inventory();
        let mut b = three_rows(&inv);
        let before = ids(&b);
        let middle = before[1];
        assert!(b.move_up(middle));
        assert_eq!(ids(&b), [before[1], before[0], before[2]]);
        assert!(b.move_down(middle));
        assert_eq!(ids(&b), before);
    }

    #[test]
    fn boundary_moves_are_noops() {
        let inv = demo::demo_inventory();
        let mut b = three_rows(&inv);
        let before = ids(&b);
        assert!(!b.move_up(before[0]));
        assert!(!b.move_down(before[2]));
        assert!(!b.move_up(RowId(999)));
        assert_eq!(ids(&b), before);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn remove_row_keeps_other_ids() {
        let inv = demo::demo_inventory();
        let mut b = three_rows(&inv);
        let before = ids(&b);
        assert!(b.remove_row(before[1]));
        assert!(!b.remove_row(before[1]));
        assert_eq!(ids(&b), [before[0], before[2]]);
        b.add_row(&inv, None);
        assert!(!before.contains(&b.rows()[2].id));
    }

    #[test]
    fn evening_steps_serialize_densely() {
        let inv = demo::demo_inventory();
        let lamp = DeviceId::from(demo::LIVING_LAMP_ID);
        let mut b = SequenceBuilder::new();
        b.add_row(&inv, Some(&Step::action(lamp.as_str(), "on").to_record()));
        b.add_row(&inv, Some(&Step::pause("30").to_record()));

        assert_eq!(
            b.serialize().to_value(),
            serde_json::json!({
                "0": { "uuid": demo::LIVING_LAMP_ID, "command": "on" },
                "1": { "command": "scenariosleep", "delay": "30" }
            })
        );
    }

    #[test]
    fn load_reports_unmatched_positions() {
        let inv = demo::demo_inventory();
        let map = ScenarioMap::from_steps(&[
            Step::action(demo::LIVING_LAMP_ID, "on"),
            Step::action("D9", "on"),
            Step::pause("1"),
        ]);
        let mut b = SequenceBuilder::new();
        assert_eq!(b.load(&inv, &map), [1]);
        assert!(b.rows()[1].is_invalid());

        let saved = b.serialize();
        assert_eq!(saved.records()[0], map.records()[0]);
        assert_eq!(saved.records()[1], Step::action(demo::GOOD_NIGHT_ID, "on").to_record());
        assert_eq!(saved.records()[2], map.records()[2]);
    }

    #[test]
    fn repaired_row_saves_new_selection() {
        let inv = demo::demo_inventory();
        let map = ScenarioMap::from_steps(&[Step::action("D9", "on"), Step::pause("10")]);
        let mut b = SequenceBuilder::new();
        assert_eq!(b.load(&inv, &map), [0]);

        let id = b.rows()[0].id;
        let dimmer = b.rows()[0]
            .devices()
            .iter()
            .position(|o| o.choice == DeviceChoice::Device(DeviceId::from(demo::KITCHEN_DIMMER_ID)))
            .unwrap();
        b.select_device(&inv, id, dimmer).unwrap();
        b.select_command(&inv, id, 2).unwrap();
        b.set_param(id, "level", "55").unwrap();
        assert!(!b.rows()[0].is_invalid());

        let saved = b.serialize();
        let expected = ScenarioMap::from_steps(&[
            Step::action(demo::KITCHEN_DIMMER_ID, "setlevel").with_param("level", "55"),
            Step::pause("10"),
        ]);
        assert_eq!(saved, expected);

        let mut again = SequenceBuilder::new();
        assert!(again.load(&inv, &saved).is_empty());
        assert_eq!(again.serialize(), saved);
    }

    #[test]
    fn stray_pause_command_saves_as_pause() {
        let inv = demo::demo_inventory();
        let map: ScenarioMap = serde_json::from_value(serde_json::json!({
            "0": { "command": "off", "delay": "4" }
        }))
        .unwrap();
        let mut b = SequenceBuilder::new();
        assert_eq!(b.load(&inv, &map), [0]);
        assert!(b.rows()[0].is_pause());

        let saved = b.serialize();
        assert_eq!(saved, ScenarioMap::from_steps(&[Step::pause("4")]));
        let mut again = SequenceBuilder::new();
        assert!(again.load(&inv, &saved).is_empty());
        assert_eq!(again.serialize(), saved);
    }

    #[test]
    fn edits_on_unknown_row_fail() {
        let inv = demo::demo_inventory();
        let mut b = SequenceBuilder::new();
        assert!(matches!(
            b.select_device(&inv, RowId(7), 0),
            Err(AppError::NotFound { .. })
        ));
    }
}
