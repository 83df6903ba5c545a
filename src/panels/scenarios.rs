use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use ts_rs::TS;

use super::{Surface, SurfaceState};
use crate::builder::SequenceBuilder;
use crate::client::{CommandClient, Request};
use crate::error::AppError;
use crate::model::{devicetype, Device, DeviceId, Inventory, ScenarioMap};
use crate::state::DashboardState;

const NAME_REQUIRED: &str = "Please type a scenario name!";
const PARTIAL_MATCH: &str = "One or more commands in this scenario did not fully match existing devices.";

/// Result of opening a scenario for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct EditOutcome {
    pub rows: usize,
    /// Positions of steps whose device or command no longer exists.
    pub unmatched: Vec<usize>,
}

#[derive(Default)]
struct Draft {
    name: String,
    builder: SequenceBuilder,
}

/// Holds the create form's in-flight flag. Released on drop, so a create
/// future abandoned mid-request does not leave the form stuck.
struct CreateGuard<'a>(&'a AtomicBool);

impl<'a> CreateGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::SeqCst)).then_some(Self(flag))
    }
}

impl Drop for CreateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ── Scenario Panel ─────────────────────────────────────────────────

/// The scenario page: a create form with its own builder, an edit dialog,
/// a delete confirmation, and the scenario list actions.
///
/// Methods take `&self`; no lock is held across an await. Lock order when
/// nesting is surface, then inventory, then draft/editor.
pub struct ScenarioPanel {
    client: Arc<dyn CommandClient>,
    state: Arc<DashboardState>,
    surface: Mutex<Surface<DeviceId>>,
    draft: Mutex<Draft>,
    editor: Mutex<SequenceBuilder>,
    creating: AtomicBool,
}

impl ScenarioPanel {
    pub fn new(client: Arc<dyn CommandClient>, state: Arc<DashboardState>) -> Self {
        Self {
            client,
            state,
            surface: Mutex::new(Surface::default()),
            draft: Mutex::new(Draft::default()),
            editor: Mutex::new(SequenceBuilder::new()),
            creating: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Scenario devices in the inventory, sorted by name.
    pub fn scenarios(&self) -> Vec<Device> {
        self.state
            .with_inventory(|inv| inv.scenarios().into_iter().cloned().collect())
    }

    pub fn surface(&self) -> SurfaceState {
        self.surface.lock().state()
    }

    /// The scenario the open dialog is about.
    pub fn open_scenario(&self) -> Option<DeviceId> {
        self.surface.lock().subject().cloned()
    }

    // ── Create form ────────────────────────────────────────────────

    pub fn set_name(&self, name: &str) {
        self.draft.lock().name = name.to_string();
    }

    pub fn name(&self) -> String {
        self.draft.lock().name.clone()
    }

    /// Work on the create form's builder.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SequenceBuilder, &Inventory) -> R,
    {
        self.state.with_inventory(|inv| {
            let mut draft = self.draft.lock();
            f(&mut draft.builder, inv)
        })
    }

    /// Store the create form as a new scenario and name it. Returns the id
    /// the scenario controller assigned.
    pub async fn create(&self) -> Result<DeviceId, AppError> {
        let name = self.name().trim().to_string();
        if name.is_empty() {
            self.state.warn(NAME_REQUIRED);
            return Err(AppError::ValidationError {
                message: NAME_REQUIRED.into(),
            });
        }
        let Some(_creating) = CreateGuard::acquire(&self.creating) else {
            return Err(self.fail(AppError::Busy {
                surface: "create".into(),
            }));
        };

        let result = self.store_new(&name).await;

        match result {
            Ok(id) => {
                let mut draft = self.draft.lock();
                draft.name.clear();
                draft.builder.clear();
                tracing::info!(scenario = %id, name = %name, "scenario created");
                Ok(id)
            }
            Err(e) => {
                self.state.warn(format!("Could not create scenario: {e}"));
                Err(e)
            }
        }
    }

    async fn store_new(&self, name: &str) -> Result<DeviceId, AppError> {
        let (scenario_ctl, ago_ctl) = self.state.with_inventory(|inv| {
            Ok::<_, AppError>((
                inv.controller(devicetype::SCENARIO_CONTROLLER)?,
                inv.controller(devicetype::AGO_CONTROLLER)?,
            ))
        })?;
        let map = self.draft.lock().builder.serialize();

        let reply = self
            .client
            .send(Request::to(&scenario_ctl, "setscenario").with("scenariomap", map.to_value()))
            .await?;
        let id = reply
            .require("scenario")?
            .as_str()
            .map(DeviceId::from)
            .ok_or_else(|| AppError::ProtocolError {
                message: "scenario id is not a string".into(),
            })?;

        self.client
            .send(
                Request::to(&ago_ctl, "setdevicename")
                    .with("device", id.as_str())
                    .with("name", name),
            )
            .await?;
        // The new device shows up with the next inventory refresh.
        Ok(id)
    }

    // ── Edit dialog ────────────────────────────────────────────────

    /// Work on the edit dialog's builder.
    pub fn with_editor<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SequenceBuilder, &Inventory) -> R,
    {
        self.state.with_inventory(|inv| {
            let mut editor = self.editor.lock();
            f(&mut editor, inv)
        })
    }

    /// Fetch the steps of a stored scenario.
    pub async fn fetch_steps(&self, scenario: &DeviceId) -> Result<ScenarioMap, AppError> {
        let ctl = self
            .state
            .with_inventory(|inv| inv.controller(devicetype::SCENARIO_CONTROLLER))?;
        let reply = self
            .client
            .send(Request::to(&ctl, "getscenario").with("scenario", scenario.as_str()))
            .await?;
        serde_json::from_value(reply.require("scenariomap")?.clone()).map_err(|e| AppError::ProtocolError {
            message: format!("scenariomap: {e}"),
        })
    }

    /// Open the edit dialog for a scenario and replay its steps into the
    /// editor. Steps that no longer match produce one warning.
    pub async fn edit(&self, scenario: &DeviceId) -> Result<EditOutcome, AppError> {
        let session = self
            .surface
            .lock()
            .open(SurfaceState::Fetching, scenario.clone())
            .map_err(|e| self.fail(e))?;

        let fetched = self.fetch_steps(scenario).await;

        let mut surface = self.surface.lock();
        if !surface.is_current(session, SurfaceState::Fetching) {
            tracing::debug!(scenario = %scenario, "dropping stale getscenario reply");
            return Err(AppError::StaleSession);
        }
        let map = match fetched {
            Ok(map) => map,
            Err(e) => {
                surface.settle(SurfaceState::Closed);
                drop(surface);
                self.state.error(format!("Could not load scenario: {e}"));
                return Err(e);
            }
        };

        let outcome = self.state.with_inventory(|inv| {
            let mut editor = self.editor.lock();
            let unmatched = editor.load(inv, &map);
            EditOutcome {
                rows: editor.len(),
                unmatched,
            }
        });
        surface.settle(SurfaceState::Editing);
        drop(surface);

        if !outcome.unmatched.is_empty() {
            self.state.warn(PARTIAL_MATCH);
        }
        Ok(outcome)
    }

    /// Store the edit dialog's steps under the open scenario's id.
    pub async fn save(&self) -> Result<(), AppError> {
        let (session, scenario) = self
            .surface
            .lock()
            .advance(SurfaceState::Editing, SurfaceState::Saving)
            .map_err(|e| self.fail(e))?;
        let map = self.editor.lock().serialize();

        let result = self.store_steps(&scenario, &map).await;

        let mut surface = self.surface.lock();
        if !surface.is_current(session, SurfaceState::Saving) {
            tracing::debug!(scenario = %scenario, "dropping stale setscenario reply");
            return Err(AppError::StaleSession);
        }
        match result {
            Ok(()) => {
                surface.settle(SurfaceState::Closed);
                self.editor.lock().clear();
                tracing::info!(scenario = %scenario, steps = map.len(), "scenario saved");
                Ok(())
            }
            Err(e) => {
                surface.settle(SurfaceState::Editing);
                drop(surface);
                self.state.error(format!("Could not save scenario: {e}"));
                Err(e)
            }
        }
    }

    async fn store_steps(&self, scenario: &DeviceId, map: &ScenarioMap) -> Result<(), AppError> {
        let ctl = self
            .state
            .with_inventory(|inv| inv.controller(devicetype::SCENARIO_CONTROLLER))?;
        self.client
            .send(
                Request::to(&ctl, "setscenario")
                    .with("scenario", scenario.as_str())
                    .with("scenariomap", map.to_value()),
            )
            .await?;
        Ok(())
    }

    /// Close any open dialog. Replies still in flight are discarded, except
    /// that a delete the controller confirms is still applied locally.
    pub fn cancel(&self) {
        let mut surface = self.surface.lock();
        if surface.state() != SurfaceState::Closed {
            tracing::debug!(surface = surface.state().name(), "dialog cancelled");
        }
        surface.cancel();
        drop(surface);
        self.editor.lock().clear();
    }

    // ── Delete ─────────────────────────────────────────────────────

    /// Ask for confirmation before deleting a scenario.
    pub fn request_delete(&self, scenario: &DeviceId) -> Result<(), AppError> {
        let opened = {
            let mut surface = self.surface.lock();
            let known = self
                .state
                .with_inventory(|inv| inv.device(scenario).is_some_and(Device::is_scenario));
            if known {
                surface.open(SurfaceState::ConfirmDelete, scenario.clone()).map(|_| ())
            } else {
                Err(AppError::NotFound {
                    what: format!("Scenario '{scenario}'"),
                })
            }
        };
        opened.map_err(|e| self.fail(e))
    }

    /// Delete the scenario awaiting confirmation. The local entry goes away
    /// only once the controller confirms.
    pub async fn confirm_delete(&self) -> Result<(), AppError> {
        let (session, scenario) = self
            .surface
            .lock()
            .advance(SurfaceState::ConfirmDelete, SurfaceState::Deleting)
            .map_err(|e| self.fail(e))?;

        let result = self.send_delete(&scenario).await;

        if result.is_ok() {
            self.state.with_inventory_mut(|inv| inv.remove_device(&scenario));
            tracing::info!(scenario = %scenario, "scenario deleted");
        }
        {
            let mut surface = self.surface.lock();
            if surface.is_current(session, SurfaceState::Deleting) {
                surface.settle(SurfaceState::Closed);
            }
        }
        result.map_err(|e| {
            self.state.error(format!("Error while deleting scenario: {e}"));
            e
        })
    }

    async fn send_delete(&self, scenario: &DeviceId) -> Result<(), AppError> {
        let ctl = self
            .state
            .with_inventory(|inv| inv.controller(devicetype::SCENARIO_CONTROLLER))?;
        self.client
            .send(Request::to(&ctl, "delscenario").with("scenario", scenario.as_str()))
            .await?;
        Ok(())
    }

    /// Request and confirm in one step, for callers with their own prompt.
    pub async fn delete(&self, scenario: &DeviceId) -> Result<(), AppError> {
        self.request_delete(scenario)?;
        self.confirm_delete().await
    }

    // ── List actions ───────────────────────────────────────────────

    /// Trigger a scenario. Failures are logged, never shown.
    pub async fn run(&self, scenario: &DeviceId) {
        match self.client.send(Request::to(scenario, "on")).await {
            Ok(_) => tracing::info!(scenario = %scenario, "scenario started"),
            Err(e) => tracing::warn!(scenario = %scenario, "scenario run failed: {e}"),
        }
    }

    pub async fn rename(&self, scenario: &DeviceId, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        if name.is_empty() {
            self.state.warn(NAME_REQUIRED);
            return Err(AppError::ValidationError {
                message: NAME_REQUIRED.into(),
            });
        }
        let ctl = self
            .state
            .with_inventory(|inv| inv.controller(devicetype::AGO_CONTROLLER))
            .map_err(|e| self.fail(e))?;
        let request = Request::to(&ctl, "setdevicename")
            .with("device", scenario.as_str())
            .with("name", name);
        match self.client.send(request).await {
            Ok(_) => {
                self.state.with_inventory_mut(|inv| inv.rename_device(scenario, name));
                Ok(())
            }
            Err(e) => {
                self.state.error(format!("Could not rename scenario: {e}"));
                Err(e)
            }
        }
    }

    /// Assign a scenario to a room by room id; an empty id clears the room.
    pub async fn set_room(&self, scenario: &DeviceId, room: &str) -> Result<(), AppError> {
        let ctl = self
            .state
            .with_inventory(|inv| {
                if !room.is_empty() && !inv.rooms.contains_key(room) {
                    return Err(AppError::NotFound {
                        what: format!("Room '{room}'"),
                    });
                }
                inv.controller(devicetype::AGO_CONTROLLER)
            })
            .map_err(|e| self.fail(e))?;
        let request = Request::to(&ctl, "setdeviceroom")
            .with("device", scenario.as_str())
            .with("room", room);
        match self.client.send(request).await {
            Ok(_) => {
                self.state.with_inventory_mut(|inv| inv.set_device_room(scenario, room));
                Ok(())
            }
            Err(e) => {
                self.state.error(format!("Could not change room: {e}"));
                Err(e)
            }
        }
    }

    fn fail(&self, err: AppError) -> AppError {
        self.state.report(&err);
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryController;
    use crate::demo;
    use crate::events::{DashboardEvent, Notice, NoticeLevel};
    use crate::model::Step;
    use tokio::sync::broadcast;

    async fn setup(ctl: MemoryController) -> (Arc<MemoryController>, ScenarioPanel) {
        let ctl = Arc::new(ctl);
        let state = Arc::new(DashboardState::load(ctl.as_ref()).await.unwrap());
        let panel = ScenarioPanel::new(ctl.clone(), state);
        (ctl, panel)
    }

    fn notices(rx: &mut broadcast::Receiver<DashboardEvent>) -> Vec<Notice> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::Notice(n) => Some(n),
                DashboardEvent::InventoryChanged => None,
            })
            .collect()
    }

    fn good_night() -> DeviceId {
        DeviceId::from(demo::GOOD_NIGHT_ID)
    }

    #[tokio::test]
    async fn create_stores_steps_then_names_scenario() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.set_name("Evening");
        panel.with_draft(|b, inv| {
            b.add_row(inv, Some(&Step::action(demo::LIVING_LAMP_ID, "on").to_record()));
            b.add_row(inv, Some(&Step::pause("30").to_record()));
        });

        let id = panel.create().await.unwrap();

        assert_eq!(ctl.commands()[1..], ["setscenario", "setdevicename"]);
        assert_eq!(
            ctl.scenario(id.as_str()).unwrap().to_value(),
            serde_json::json!({
                "0": { "uuid": demo::LIVING_LAMP_ID, "command": "on" },
                "1": { "command": "scenariosleep", "delay": "30" }
            })
        );
        assert_eq!(ctl.inventory().device(&id).unwrap().name, "Evening");
        assert_eq!(panel.name(), "");
        assert!(panel.with_draft(|b, _| b.is_empty()));

        assert!(panel.scenarios().iter().all(|d| d.id != id));
        panel.state().refresh(ctl.as_ref()).await.unwrap();
        assert!(panel.scenarios().iter().any(|d| d.id == id && d.name == "Evening"));
    }

    #[tokio::test]
    async fn abandoned_create_can_be_retried() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.set_name("Evening");
        panel.with_draft(|b, inv| b.add_row(inv, None));
        let _hold = ctl.hold_next("setscenario");

        let first = tokio::time::timeout(std::time::Duration::from_millis(50), panel.create()).await;
        assert!(first.is_err());

        let id = panel.create().await.unwrap();
        assert_eq!(ctl.inventory().device(&id).unwrap().name, "Evening");
        assert_eq!(ctl.commands().iter().filter(|c| *c == "setscenario").count(), 2);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_network() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        let mut rx = panel.state().subscribe();
        panel.set_name("   ");
        panel.with_draft(|b, inv| b.add_row(inv, None));

        let result = panel.create().await;

        assert!(matches!(result, Err(AppError::ValidationError { .. })));
        assert_eq!(ctl.commands(), ["inventory"]);
        assert_eq!(
            notices(&mut rx),
            [Notice { level: NoticeLevel::Warning, message: NAME_REQUIRED.into() }]
        );
    }

    #[tokio::test]
    async fn rejected_create_warns_once_and_keeps_draft() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        let mut rx = panel.state().subscribe();
        panel.set_name("Empty");

        assert!(panel.create().await.is_err());

        let seen = notices(&mut rx);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NoticeLevel::Warning);
        assert_eq!(panel.name(), "Empty");
        assert_eq!(ctl.commands(), ["inventory", "setscenario"]);
        assert_eq!(panel.scenarios().len(), 1);
    }

    #[tokio::test]
    async fn edit_with_missing_device_flags_row_and_still_saves() {
        let stored = ScenarioMap::from_steps(&[
            Step::action(demo::LIVING_LAMP_ID, "on"),
            Step::action("D9", "off"),
        ]);
        let ctl = demo::demo_controller().with_scenario("s-old", "Old", stored.clone());
        let (ctl, panel) = setup(ctl).await;
        let mut rx = panel.state().subscribe();
        let id = DeviceId::from("s-old");

        let outcome = panel.edit(&id).await.unwrap();

        assert_eq!(outcome, EditOutcome { rows: 2, unmatched: vec![1] });
        assert_eq!(panel.surface(), SurfaceState::Editing);
        assert!(panel.with_editor(|b, _| b.rows()[1].is_invalid()));
        assert_eq!(
            notices(&mut rx),
            [Notice { level: NoticeLevel::Warning, message: PARTIAL_MATCH.into() }]
        );

        panel.save().await.unwrap();
        assert_eq!(panel.surface(), SurfaceState::Closed);
        // The flagged row saves what its selectors fell back to.
        let saved = ctl.scenario("s-old").unwrap();
        assert_eq!(saved.records()[0], stored.records()[0]);
        assert_eq!(saved.records()[1], Step::action(demo::GOOD_NIGHT_ID, "on").to_record());
        assert!(panel.with_editor(|b, _| b.is_empty()));
    }

    #[tokio::test]
    async fn edit_then_save_keeps_id_and_new_order() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.edit(&good_night()).await.unwrap();
        panel.with_editor(|b, _| {
            let last = b.rows()[3].id;
            b.move_up(last);
        });
        panel.save().await.unwrap();

        let saved = ctl.scenario(demo::GOOD_NIGHT_ID).unwrap();
        let commands: Vec<&str> = saved
            .records()
            .iter()
            .map(|r| r.command.as_deref().unwrap())
            .collect();
        assert_eq!(commands, ["setlevel", "scenariosleep", "off", "off"]);
        assert_eq!(saved.records()[2].uuid.as_deref(), Some(demo::LIVING_LAMP_ID));
        let request = ctl.requests().into_iter().last().unwrap();
        assert_eq!(request.str_field("scenario"), Some(demo::GOOD_NIGHT_ID));
    }

    #[tokio::test]
    async fn failed_save_returns_to_editing() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.edit(&good_night()).await.unwrap();
        ctl.fail_next("setscenario", "Backend timeout");

        let result = panel.save().await;

        assert!(matches!(result, Err(AppError::RemoteError { .. })));
        assert_eq!(panel.surface(), SurfaceState::Editing);
        assert_eq!(panel.with_editor(|b, _| b.len()), 4);
        assert_eq!(ctl.scenario(demo::GOOD_NIGHT_ID), Some(demo::good_night_steps()));
    }

    #[tokio::test]
    async fn late_reply_for_cancelled_session_is_discarded() {
        let (ctl, panel) = setup(demo::demo_controller().with_scenario(
            "s-two",
            "Two",
            ScenarioMap::from_steps(&[Step::pause("1"), Step::pause("2")]),
        ))
        .await;
        let hold = ctl.hold_next("getscenario");

        let gn = good_night();
        let (first, second) = tokio::join!(panel.edit(&gn), async {
            tokio::task::yield_now().await;
            panel.cancel();
            let second = panel.edit(&DeviceId::from("s-two")).await;
            hold.notify_one();
            second
        });

        assert_eq!(first, Err(AppError::StaleSession));
        assert_eq!(second.unwrap().rows, 2);
        assert_eq!(panel.surface(), SurfaceState::Editing);
        assert_eq!(panel.open_scenario(), Some(DeviceId::from("s-two")));
        assert_eq!(panel.with_editor(|b, _| b.len()), 2);
    }

    #[tokio::test]
    async fn second_dialog_is_busy() {
        let (_ctl, panel) = setup(demo::demo_controller()).await;
        panel.edit(&good_night()).await.unwrap();
        assert!(matches!(
            panel.request_delete(&good_night()),
            Err(AppError::Busy { .. })
        ));
        panel.cancel();
        assert!(panel.request_delete(&good_night()).is_ok());
        assert_eq!(panel.surface(), SurfaceState::ConfirmDelete);
    }

    #[tokio::test]
    async fn failed_delete_keeps_scenario() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        let mut rx = panel.state().subscribe();
        ctl.fail_next("delscenario", "Backend timeout");

        panel.request_delete(&good_night()).unwrap();
        let result = panel.confirm_delete().await;

        assert!(result.is_err());
        assert_eq!(panel.surface(), SurfaceState::Closed);
        assert_eq!(panel.scenarios().len(), 1);
        let seen = notices(&mut rx);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn delete_removes_exactly_once() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.request_delete(&good_night()).unwrap();
        panel.confirm_delete().await.unwrap();

        assert!(panel.scenarios().is_empty());
        assert!(panel.confirm_delete().await.is_err());
        let deletes = ctl.commands().iter().filter(|c| *c == "delscenario").count();
        assert_eq!(deletes, 1);
        assert_eq!(ctl.scenario(demo::GOOD_NIGHT_ID), None);
    }

    #[tokio::test]
    async fn confirm_while_deleting_is_rejected() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        let hold = ctl.hold_next("delscenario");
        panel.request_delete(&good_night()).unwrap();

        let (first, second) = tokio::join!(panel.confirm_delete(), async {
            tokio::task::yield_now().await;
            let second = panel.confirm_delete().await;
            hold.notify_one();
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::Busy { .. })));
        assert_eq!(ctl.commands().iter().filter(|c| *c == "delscenario").count(), 1);
    }

    #[tokio::test]
    async fn run_failure_is_only_logged() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        let mut rx = panel.state().subscribe();
        ctl.fail_next("on", "offline");

        panel.run(&good_night()).await;
        assert!(notices(&mut rx).is_empty());
        assert!(ctl.dispatched().is_empty());

        panel.run(&good_night()).await;
        assert_eq!(ctl.dispatched().len(), 4);
    }

    #[tokio::test]
    async fn rename_and_room_update_inventory() {
        let (ctl, panel) = setup(demo::demo_controller()).await;
        panel.rename(&good_night(), "  Bedtime ").await.unwrap();
        panel.set_room(&good_night(), "hall").await.unwrap();

        let scenario = panel.scenarios().into_iter().next().unwrap();
        assert_eq!(scenario.name, "Bedtime");
        assert_eq!(scenario.room.as_deref(), Some("Hall"));
        assert_eq!(ctl.inventory().device(&good_night()).unwrap().name, "Bedtime");

        assert!(panel.rename(&good_night(), "").await.is_err());
        assert!(matches!(
            panel.set_room(&good_night(), "attic").await,
            Err(AppError::NotFound { .. })
        ));
    }
}
