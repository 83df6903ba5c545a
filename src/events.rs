//! Events the dashboard state broadcasts to whatever renders it. The string
//! names are what a renderer listens on; `DashboardEvent::name` maps to them.

use serde::Serialize;
use ts_rs::TS;

pub const NOTICE: &str = "dashboard:notice";
pub const INVENTORY_CHANGED: &str = "dashboard:inventory-changed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum DashboardEvent {
    Notice(Notice),
    /// The shared inventory was replaced or mutated.
    InventoryChanged,
}

impl DashboardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::Notice(_) => NOTICE,
            DashboardEvent::InventoryChanged => INVENTORY_CHANGED,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_with_lowercase_level() {
        let event = DashboardEvent::Notice(Notice {
            level: NoticeLevel::Warning,
            message: "Please type a scenario name!".into(),
        });
        assert_eq!(event.name(), NOTICE);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "event": "Notice",
                "payload": { "level": "warning", "message": "Please type a scenario name!" }
            })
        );
    }
}
