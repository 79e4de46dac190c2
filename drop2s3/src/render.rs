//! Terminal output for reports: a fixed-width table by default, JSON with `--json`.
//! Everything goes to stdout; logs go to stderr.

use anyhow::Result;
use drop2s3_core::partition::YearMonth;
use drop2s3_core::report::{MkdirReport, OperationReport, Outcome};
use drop2s3_core::store::ReconciliationStore;
use drop2s3_core::workflow::WorkflowReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

#[derive(Serialize)]
struct StatusRow {
    filename: String,
    state: &'static str,
    in_inbox: bool,
    in_staging: bool,
    in_remote: bool,
}

fn mark(present: bool) -> &'static str {
    if present {
        "x"
    } else {
        "-"
    }
}

impl Output {
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn report(&self, report: &OperationReport) -> Result<()> {
        if self.json {
            return self.print_json(report);
        }
        let mode = if report.dry_run { " (dry run)" } else { "" };
        println!("== {}{} ==", report.operation, mode);
        for d in &report.decisions {
            println!(
                "{:<40}{:<24}{:<10}{}",
                d.filename,
                d.state.as_str(),
                d.action.to_string(),
                d.outcome
            );
        }

        let count = |f: fn(&Outcome) -> bool| report.decisions.iter().filter(|d| f(&d.outcome)).count();
        println!(
            "{} files: {} selected, {} skipped, {} flagged, {} failed",
            report.decisions.len(),
            count(Outcome::is_selected),
            count(|o| matches!(o, Outcome::Skipped { .. })),
            count(|o| matches!(o, Outcome::Flagged { .. })),
            count(|o| matches!(o, Outcome::Failed { .. })),
        );
        Ok(())
    }

    pub fn mkdir(&self, report: &MkdirReport) -> Result<()> {
        if self.json {
            return self.print_json(report);
        }
        let verb = if report.dry_run { "would create" } else { "created" };
        for dir in &report.created {
            println!("{:<14}{}", verb, dir.display());
        }
        for dir in &report.existing {
            println!("{:<14}{}", "exists", dir.display());
        }
        Ok(())
    }

    pub fn workflow(&self, report: &WorkflowReport) -> Result<()> {
        if self.json {
            return self.print_json(report);
        }
        self.mkdir(&report.mkdir)?;
        self.report(&report.diff_local)?;
        if let Some(copy) = &report.copy {
            self.report(copy)?;
        }
        if let Some(upload) = &report.upload {
            self.report(upload)?;
        }
        match report.stopped {
            Some(stop) => println!("workflow stopped: {}", serde_json::to_string(&stop)?.trim_matches('"')),
            None => println!("workflow complete; run rm-inbox to clear backed-up files"),
        }
        Ok(())
    }

    pub fn listing(&self, names: &[String]) -> Result<()> {
        if self.json {
            return self.print_json(names);
        }
        for name in names {
            println!("{name}");
        }
        Ok(())
    }

    pub fn status(&self, store: &ReconciliationStore) -> Result<()> {
        let rows: Vec<StatusRow> = store
            .iter()
            .map(|r| StatusRow {
                state: r.state().as_str(),
                filename: r.filename,
                in_inbox: r.in_inbox,
                in_staging: r.in_staging,
                in_remote: r.in_remote,
            })
            .collect();
        if self.json {
            return self.print_json(&rows);
        }
        println!("{:<40}{:<32}{:<6}{:<8}{}", "FILE", "STATE", "INBOX", "STAGING", "REMOTE");
        for row in &rows {
            println!(
                "{:<40}{:<32}{:<6}{:<8}{}",
                row.filename,
                row.state,
                mark(row.in_inbox),
                mark(row.in_staging),
                mark(row.in_remote)
            );
        }
        Ok(())
    }

    pub fn partitions(&self, found: &[YearMonth]) -> Result<()> {
        if self.json {
            return self.print_json(found);
        }
        for ym in found {
            println!("{ym}");
        }
        Ok(())
    }
}
