//! Filter diagnostics routed to `tracing`.

use tessera_core::{FilterObserver, SkipReason};

/// Logs exclusions at `debug` and skips at `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FilterObserver for TracingObserver {
    fn excluded(&self, component_id: &str, filter_id: &str) {
        tracing::debug!(component_id, filter_id, "component excluded");
    }

    fn skipped(&self, filter_id: &str, component_id: Option<&str>, reason: SkipReason) {
        match component_id {
            Some(component_id) => tracing::trace!(
                filter_id,
                component_id,
                reason = reason.as_str(),
                "filter skipped for component"
            ),
            None => tracing::trace!(filter_id, reason = reason.as_str(), "filter skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_core::{DashboardConfig, DashboardSession, FilterValue};

    #[test]
    fn session_accepts_tracing_observer() {
        let config = DashboardConfig::from_json(
            r#"{"components":[{"id":"c1","title":"Revenue"}],
                "filters":[{"id":"q","type":"search"}]}"#,
        )
        .expect("parse");
        let mut session =
            DashboardSession::in_memory(config).with_observer(Arc::new(TracingObserver));
        session
            .set_filter("q", FilterValue::text("costs"))
            .expect("set");
        assert!(session.visible().is_empty());
        assert_eq!(session.exclusions().len(), 1);
    }
}
