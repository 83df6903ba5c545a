use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use ts_rs::TS;

use super::{Surface, SurfaceState};
use crate::client::{CommandClient, Request};
use crate::error::AppError;
use crate::model::devicetype;
use crate::model::inventory::parse_bool;
use crate::state::DashboardState;

const NAME_REQUIRED: &str = "A variable must have a name";
const ALREADY_EXISTS: &str = "Variable already exists";
const NEW_VARIABLE_VALUE: &str = "true";

/// One line of the variables table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct VariableRow {
    pub name: String,
    pub value: String,
    /// Set for "true"/"false" values, which the table shows as a toggle.
    pub boolean: Option<bool>,
}

/// The global variables page.
pub struct VariablesPanel {
    client: Arc<dyn CommandClient>,
    state: Arc<DashboardState>,
    new_name: Mutex<String>,
    surface: Mutex<Surface<String>>,
}

impl VariablesPanel {
    pub fn new(client: Arc<dyn CommandClient>, state: Arc<DashboardState>) -> Self {
        Self {
            client,
            state,
            new_name: Mutex::new(String::new()),
            surface: Mutex::new(Surface::default()),
        }
    }

    pub fn variables(&self) -> Vec<VariableRow> {
        self.state.with_inventory(|inv| {
            inv.variables()
                .iter()
                .map(|(name, value)| VariableRow {
                    name: name.clone(),
                    value: value.clone(),
                    boolean: parse_bool(value),
                })
                .collect()
        })
    }

    pub fn surface(&self) -> SurfaceState {
        self.surface.lock().state()
    }

    pub fn set_new_name(&self, name: &str) {
        *self.new_name.lock() = name.to_string();
    }

    pub fn new_name(&self) -> String {
        self.new_name.lock().clone()
    }

    /// Create the variable named in the form, initialised to "true".
    pub async fn create(&self) -> Result<(), AppError> {
        let name = self.new_name().trim().to_string();
        let exists = self.state.with_inventory(|inv| inv.variable(&name).is_some());
        let message = if name.is_empty() {
            Some(NAME_REQUIRED)
        } else if exists {
            Some(ALREADY_EXISTS)
        } else {
            None
        };
        if let Some(message) = message {
            self.state.warn(message);
            return Err(AppError::ValidationError {
                message: message.into(),
            });
        }

        self.set(&name, NEW_VARIABLE_VALUE).await?;
        self.new_name.lock().clear();
        Ok(())
    }

    /// Store a value. Returns false without a round trip when the value is
    /// unchanged.
    pub async fn set(&self, name: &str, value: &str) -> Result<bool, AppError> {
        let (ctl, current) = self
            .state
            .with_inventory(|inv| {
                let ctl = inv.controller(devicetype::AGO_CONTROLLER)?;
                Ok::<_, AppError>((ctl, inv.variable(name).map(str::to_string)))
            })
            .map_err(|e| {
                self.state.report(&e);
                e
            })?;
        if current.as_deref() == Some(value) {
            return Ok(false);
        }

        let request = Request::to(&ctl, "setvariable")
            .with("variable", name)
            .with("value", value);
        match self.client.send(request).await {
            Ok(_) => {
                self.state.with_inventory_mut(|inv| inv.set_variable(name, value));
                tracing::info!(variable = name, value, "variable set");
                Ok(true)
            }
            Err(e) => {
                self.state.error(format!("Could not set variable: {e}"));
                Err(e)
            }
        }
    }

    /// Flip a boolean variable. Returns the new value, or None (and does
    /// nothing) when the variable does not hold "true"/"false".
    pub async fn toggle(&self, name: &str) -> Result<Option<bool>, AppError> {
        let current = self.state.with_inventory(|inv| {
            inv.variable(name)
                .map(|_| inv.variable_bool(name))
                .ok_or_else(|| AppError::NotFound {
                    what: format!("Variable '{name}'"),
                })
        });
        let current = match current {
            Ok(current) => current,
            Err(e) => {
                self.state.report(&e);
                return Err(e);
            }
        };
        let Some(current) = current else {
            return Ok(None);
        };
        let next = !current;
        self.set(name, if next { "true" } else { "false" }).await?;
        Ok(Some(next))
    }

    // ── Delete ─────────────────────────────────────────────────────

    pub fn request_delete(&self, name: &str) -> Result<(), AppError> {
        let opened = {
            let mut surface = self.surface.lock();
            if self.state.with_inventory(|inv| inv.variable(name).is_some()) {
                surface
                    .open(SurfaceState::ConfirmDelete, name.to_string())
                    .map(|_| ())
            } else {
                Err(AppError::NotFound {
                    what: format!("Variable '{name}'"),
                })
            }
        };
        opened.map_err(|e| {
            self.state.report(&e);
            e
        })
    }

    pub async fn confirm_delete(&self) -> Result<(), AppError> {
        let (session, name) = self
            .surface
            .lock()
            .advance(SurfaceState::ConfirmDelete, SurfaceState::Deleting)
            .map_err(|e| {
                self.state.report(&e);
                e
            })?;

        let result = self.send_delete(&name).await;

        if result.is_ok() {
            self.state.with_inventory_mut(|inv| inv.remove_variable(&name));
            tracing::info!(variable = %name, "variable deleted");
        }
        {
            let mut surface = self.surface.lock();
            if surface.is_current(session, SurfaceState::Deleting) {
                surface.settle(SurfaceState::Closed);
            }
        }
        result.map_err(|e| {
            self.state.error(format!("Error while deleting variable: {e}"));
            e
        })
    }

    async fn send_delete(&self, name: &str) -> Result<(), AppError> {
        let ctl = self
            .state
            .with_inventory(|inv| inv.controller(devicetype::AGO_CONTROLLER))?;
        self.client
            .send(Request::to(&ctl, "delvariable").with("variable", name))
            .await?;
        Ok(())
    }

    pub fn cancel(&self) {
        self.surface.lock().cancel();
    }

    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        self.request_delete(name)?;
        self.confirm_delete().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryController;
    use crate::demo;
    use crate::events::{DashboardEvent, Notice, NoticeLevel};

    async fn setup() -> (Arc<MemoryController>, VariablesPanel) {
        let ctl = Arc::new(demo::demo_controller());
        let state = Arc::new(DashboardState::load(ctl.as_ref()).await.unwrap());
        let panel = VariablesPanel::new(ctl.clone(), state);
        (ctl, panel)
    }

    fn warnings(rx: &mut tokio::sync::broadcast::Receiver<DashboardEvent>) -> Vec<String> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::Notice(Notice { level: NoticeLevel::Warning, message }) => Some(message),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn create_sets_true_and_clears_form() {
        let (ctl, panel) = setup().await;
        panel.set_new_name(" night ");
        panel.create().await.unwrap();

        assert_eq!(panel.new_name(), "");
        assert_eq!(ctl.inventory().variable("night"), Some("true"));
        let row = panel.variables().into_iter().find(|v| v.name == "night").unwrap();
        assert_eq!(row.boolean, Some(true));
    }

    #[tokio::test]
    async fn create_rejects_blank_and_duplicate_names_locally() {
        let (ctl, panel) = setup().await;
        let mut rx = panel.state.subscribe();

        panel.set_new_name("  ");
        assert!(panel.create().await.is_err());
        panel.set_new_name("away");
        assert!(panel.create().await.is_err());

        assert_eq!(warnings(&mut rx), [NAME_REQUIRED, ALREADY_EXISTS]);
        assert_eq!(ctl.commands(), ["inventory"]);
        assert_eq!(panel.new_name(), "away");
    }

    #[tokio::test]
    async fn unchanged_value_skips_round_trip() {
        let (ctl, panel) = setup().await;
        assert!(!panel.set("mode", "day").await.unwrap());
        assert!(panel.set("mode", "night").await.unwrap());
        assert_eq!(ctl.commands(), ["inventory", "setvariable"]);
        assert_eq!(ctl.inventory().variable("mode"), Some("night"));
    }

    #[tokio::test]
    async fn toggle_flips_booleans_only() {
        let (ctl, panel) = setup().await;
        assert_eq!(panel.toggle("away").await.unwrap(), Some(true));
        assert_eq!(ctl.inventory().variable("away"), Some("true"));
        assert_eq!(panel.toggle("away").await.unwrap(), Some(false));

        assert_eq!(panel.toggle("mode").await.unwrap(), None);
        assert!(matches!(panel.toggle("missing").await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_needs_confirmation_and_success() {
        let (ctl, panel) = setup().await;
        ctl.fail_next("delvariable", "Backend timeout");
        assert!(panel.delete("mode").await.is_err());
        assert!(panel.variables().iter().any(|v| v.name == "mode"));
        assert_eq!(panel.surface(), SurfaceState::Closed);

        panel.request_delete("mode").unwrap();
        panel.cancel();
        assert!(panel.confirm_delete().await.is_err());

        panel.delete("mode").await.unwrap();
        assert!(panel.variables().iter().all(|v| v.name != "mode"));
        assert_eq!(ctl.inventory().variable("mode"), None);
    }
}
