//! Monthly budget accounting. The budget itself is derived, never stored:
//! approved hours are summed from the requests anchored to a month, and the
//! ledger only materialises a month's total when the month rolls over.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::month::MonthKey;
use crate::domain::request::Request;

/// Hours consumed in `month`: the sum of estimates over requests anchored to
/// it that are approved, finished, or archived.
pub fn approved_hours(requests: &[Request], month: &MonthKey) -> Decimal {
    requests
        .iter()
        .filter(|request| request.approved_month.as_ref() == Some(month))
        .filter(|request| request.counts_against_budget())
        .filter_map(|request| request.estimated_hours)
        .sum()
}

pub fn remaining_hours(requests: &[Request], month: &MonthKey, monthly_budget: Decimal) -> Decimal {
    monthly_budget - approved_hours(requests, month)
}

/// Display percentage, clamped to 100. The raw ratio can conceptually exceed
/// 100 but is never used to retroactively block approved work.
pub fn budget_percentage(approved: Decimal, monthly_budget: Decimal) -> f64 {
    if monthly_budget <= Decimal::ZERO {
        return 0.0;
    }
    let ratio = (approved / monthly_budget * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0);
    ratio.min(100.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetSummary {
    pub month: MonthKey,
    pub approved: Decimal,
    pub remaining: Decimal,
    pub percent_used: f64,
}

impl BudgetSummary {
    pub fn compute(requests: &[Request], month: &MonthKey, monthly_budget: Decimal) -> Self {
        let approved = approved_hours(requests, month);
        Self {
            month: month.clone(),
            approved,
            remaining: monthly_budget - approved,
            percent_used: budget_percentage(approved, monthly_budget),
        }
    }
}

/// Tracks the active budget month and the write-once history of closed
/// months.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthLedger {
    current_month: MonthKey,
    history: BTreeMap<MonthKey, Decimal>,
}

impl MonthLedger {
    pub fn new(current_month: MonthKey) -> Self {
        Self { current_month, history: BTreeMap::new() }
    }

    pub fn current_month(&self) -> &MonthKey {
        &self.current_month
    }

    pub fn history(&self) -> &BTreeMap<MonthKey, Decimal> {
        &self.history
    }

    /// Adopts the store's idea of the current month, keeping history intact.
    pub fn adopt_month(&mut self, month: MonthKey) {
        self.current_month = month;
    }

    /// Reconciles with a freshly fetched history snapshot: the store's value
    /// wins per key, locally rolled-over months absent from the snapshot are
    /// retained.
    pub fn merge_history(&mut self, snapshot: &BTreeMap<MonthKey, Decimal>) {
        for (month, hours) in snapshot {
            self.history.insert(month.clone(), *hours);
        }
    }

    /// Closes the active month if the detected month has moved past it: the
    /// hours still anchored to the old month are recorded (only if positive),
    /// then the ledger advances. Running the check again in the same month is
    /// a no-op, and multiple skipped months are not backfilled — the ledger
    /// jumps straight to whatever month is detected.
    pub fn roll_over(
        &mut self,
        requests: &[Request],
        detected: MonthKey,
    ) -> Option<(MonthKey, Decimal)> {
        if detected == self.current_month {
            return None;
        }

        let closed = self.current_month.clone();
        let hours = approved_hours(requests, &closed);
        if hours > Decimal::ZERO {
            // Write-once: a re-run against a stale detected month must not
            // clobber an existing entry.
            self.history.entry(closed.clone()).or_insert(hours);
        }

        info!(
            closed_month = %closed,
            new_month = %detected,
            closed_hours = %hours,
            "monthly budget rolled over"
        );
        self.current_month = detected;
        Some((closed, hours))
    }
}
