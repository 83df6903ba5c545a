use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::client::{fetch_inventory, CommandClient};
use crate::error::AppError;
use crate::events::{DashboardEvent, Notice, NoticeLevel};
use crate::model::Inventory;

const EVENT_CAPACITY: usize = 64;

// ── Dashboard State ────────────────────────────────────────────────

/// State shared by every panel: the observable inventory and the event
/// channel that carries notices and change notifications to the renderer.
pub struct DashboardState {
    inventory: Mutex<Inventory>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardState {
    pub fn new(inventory: Inventory) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inventory: Mutex::new(inventory),
            events,
        }
    }

    /// Build the state from a fresh `inventory` round trip.
    pub async fn load(client: &dyn CommandClient) -> Result<Self, AppError> {
        let inventory = fetch_inventory(client).await?;
        Ok(Self::new(inventory))
    }

    /// Replace the inventory with a fresh copy from the controller.
    pub async fn refresh(&self, client: &dyn CommandClient) -> Result<(), AppError> {
        let inventory = fetch_inventory(client).await?;
        self.with_inventory_mut(|inv| *inv = inventory);
        Ok(())
    }

    /// Read-only access to the inventory. Locks the mutex for the duration of `f`.
    pub fn with_inventory<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Inventory) -> R,
    {
        let guard = self.inventory.lock();
        f(&guard)
    }

    /// Mutating access to the inventory. Subscribers are told afterwards.
    pub fn with_inventory_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Inventory) -> R,
    {
        let result = {
            let mut guard = self.inventory.lock();
            f(&mut guard)
        };
        self.emit(DashboardEvent::InventoryChanged);
        result
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    // ── Notices ────────────────────────────────────────────────────

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => tracing::info!("{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
        self.emit(DashboardEvent::Notice(Notice { level, message }));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    /// Local failures surface as warnings, remote ones as errors.
    pub fn report(&self, err: &AppError) {
        if err.is_local() {
            self.warn(err.to_string());
        } else {
            self.error(err.to_string());
        }
    }

    // No receivers is normal for a headless caller.
    fn emit(&self, event: DashboardEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::model::DeviceId;

    #[tokio::test]
    async fn load_and_refresh_from_controller() {
        let ctl = demo::demo_controller();
        let state = DashboardState::load(&ctl).await.unwrap();
        assert_eq!(state.with_inventory(|inv| inv.scenarios().len()), 1);

        let mut rx = state.subscribe();
        state.refresh(&ctl).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), DashboardEvent::InventoryChanged);
        assert_eq!(ctl.commands(), ["inventory", "inventory"]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_inventory() {
        let ctl = demo::demo_controller();
        let state = DashboardState::new(demo::demo_inventory());
        ctl.fail_next("inventory", "Backend timeout");
        assert!(state.refresh(&ctl).await.is_err());
        assert!(state.with_inventory(|inv| inv.device(&DeviceId::from(demo::LIVING_LAMP_ID)).is_some()));
    }

    #[test]
    fn report_picks_level_from_error_kind() {
        let state = DashboardState::new(Inventory::default());
        let mut rx = state.subscribe();
        state.report(&AppError::ValidationError { message: "A variable must have a name".into() });
        state.report(&AppError::RemoteError { message: "down".into() });

        let levels: Vec<NoticeLevel> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::Notice(n) => Some(n.level),
                DashboardEvent::InventoryChanged => None,
            })
            .collect();
        assert_eq!(levels, [NoticeLevel::Warning, NoticeLevel::Error]);
    }
}
