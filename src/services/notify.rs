//! User-facing notices
//!
//! A notice is the transient "toast" shown on a dashboard after a data call
//! succeeds or fails. Services publish them through a [`Notifier`]; the
//! WebSocket hub forwards them on the `notifications` topic.

use serde::{Deserialize, Serialize};

/// Visual weight of a notice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    #[default]
    Default,
    Destructive,
}

/// A transient user-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

/// Sink for notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Drops every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, notice: Notice) {
        tracing::trace!(title = %notice.title, "Notice dropped");
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_serializes_lowercase() {
        let json = serde_json::to_string(&Notice::destructive("Error adding cart", "boom")).unwrap();
        assert!(json.contains("\"variant\":\"destructive\""));

        let json = serde_json::to_string(&Notice::success("Cart saved", "ok")).unwrap();
        assert!(json.contains("\"variant\":\"default\""));
    }

    #[test]
    fn test_variant_defaults_when_missing() {
        let notice: Notice =
            serde_json::from_str(r#"{"title": "Campaign updated", "description": "x"}"#).unwrap();
        assert_eq!(notice.variant, NoticeVariant::Default);
        assert!(!notice.is_destructive());
    }
}
