//! Sync result summaries returned to API callers and the scheduler.

use serde::Serialize;

/// Summary of one entity-type sync (customers, orders or products).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    /// Records seen in the upstream collection.
    pub total: usize,
    /// Records classified as created (external created timestamp within the
    /// last 60 seconds at sync time).
    pub created: usize,
    /// Records classified as updated.
    pub updated: usize,
}

impl SyncOutcome {
    #[must_use]
    pub const fn new(total: usize, created: usize, updated: usize) -> Self {
        Self {
            success: true,
            total,
            created,
            updated,
        }
    }
}

/// Result slot for one entity type inside a combined [`SyncReport`].
///
/// A failed entity sync carries its error text; settled results from the
/// other entity types are still reported.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EntityOutcome {
    Ok(SyncOutcome),
    Err { success: bool, error: String },
}

impl EntityOutcome {
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Err {
            success: false,
            error: error.into(),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl From<SyncOutcome> for EntityOutcome {
    fn from(outcome: SyncOutcome) -> Self {
        Self::Ok(outcome)
    }
}

/// Combined result of a full tenant sync, keyed by entity type.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub customers: EntityOutcome,
    pub orders: EntityOutcome,
    pub products: EntityOutcome,
}

impl SyncReport {
    #[must_use]
    pub fn new(customers: EntityOutcome, orders: EntityOutcome, products: EntityOutcome) -> Self {
        Self {
            success: customers.is_ok() && orders.is_ok() && products.is_ok(),
            customers,
            orders,
            products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_success_requires_all_three() {
        let ok = EntityOutcome::from(SyncOutcome::new(3, 1, 2));
        let report = SyncReport::new(ok.clone(), ok.clone(), ok.clone());
        assert!(report.success);

        let report = SyncReport::new(ok.clone(), ok, EntityOutcome::failed("boom"));
        assert!(!report.success);
    }

    #[test]
    fn outcome_serializes_with_success_flag() {
        let json = serde_json::to_value(SyncOutcome::new(537, 2, 535)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 537);
        assert_eq!(json["created"], 2);
        assert_eq!(json["updated"], 535);
    }

    #[test]
    fn failed_slot_keeps_error_text() {
        let json = serde_json::to_value(EntityOutcome::failed("tenant not found")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "tenant not found");
    }
}
