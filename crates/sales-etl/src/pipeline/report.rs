//! Invocation outcome and its text rendering

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use sales_common::Action;
use uuid::Uuid;

use super::aggregate::SalesAggregate;
use super::loader::TableLoad;

/// Summary of one successful pipeline invocation
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub action: Action,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
    pub product_sales: SalesAggregate,
    pub country_sales: SalesAggregate,
    /// Empty for `print`
    pub loads: Vec<TableLoad>,
}

impl RunReport {
    pub fn inserted(&self) -> usize {
        self.loads.iter().map(|l| l.inserted).sum()
    }

    /// Human-readable outcome returned to the CLI and HTTP callers
    pub fn render(&self) -> String {
        let mut out = String::new();

        match self.action {
            Action::Print => {
                render_section(&mut out, "Product Sales", &self.product_sales);
                render_section(&mut out, "Country Sales", &self.country_sales);
            },
            Action::Insert => {
                let _ = writeln!(out, "Action {} executed successfully", self.action);
                for load in &self.loads {
                    let _ = writeln!(out, "{}: {} row(s) inserted", load.table, load.inserted);
                }
            },
        }

        if self.rows_rejected > 0 {
            let _ = writeln!(out, "Skipped {} invalid row(s)", self.rows_rejected);
        }

        out
    }
}

fn render_section(out: &mut String, title: &str, aggregate: &SalesAggregate) {
    let _ = writeln!(out, "{}:", title);
    for (key, total) in aggregate.iter() {
        let _ = writeln!(out, "{}: {:.2}", key, total);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sales_common::TableName;

    fn report(action: Action) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            action,
            started_at: now,
            finished_at: now,
            rows_read: 3,
            rows_accepted: 2,
            rows_rejected: 1,
            product_sales: SalesAggregate::from_iter([("P1", 50.0)]),
            country_sales: SalesAggregate::from_iter([("US", 20.0), ("CA", 30.0)]),
            loads: Vec::new(),
        }
    }

    #[test]
    fn test_render_print() {
        let text = report(Action::Print).render();
        assert_eq!(
            text,
            "Product Sales:\nP1: 50.00\nCountry Sales:\nCA: 30.00\nUS: 20.00\nSkipped 1 invalid row(s)\n"
        );
    }

    #[test]
    fn test_render_print_empty_sections() {
        let mut empty = report(Action::Print);
        empty.product_sales = SalesAggregate::new();
        empty.country_sales = SalesAggregate::new();
        empty.rows_rejected = 0;

        assert_eq!(empty.render(), "Product Sales:\nCountry Sales:\n");
    }

    #[test]
    fn test_render_insert() {
        let mut inserted = report(Action::Insert);
        inserted.rows_rejected = 0;
        inserted.loads = vec![
            TableLoad {
                table: TableName::new("product_sales").unwrap(),
                attempted: 1,
                inserted: 1,
                failures: Vec::new(),
            },
            TableLoad {
                table: TableName::new("country_sales").unwrap(),
                attempted: 2,
                inserted: 2,
                failures: Vec::new(),
            },
        ];

        assert_eq!(inserted.inserted(), 3);
        assert_eq!(
            inserted.render(),
            "Action insert executed successfully\nproduct_sales: 1 row(s) inserted\ncountry_sales: 2 row(s) inserted\n"
        );
    }
}
