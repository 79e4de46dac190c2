//! Interactive questions on stdin/stderr.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use drop2s3_core::contract::Confirm;
use drop2s3_core::partition::{detect_partitions, YearMonth};

/// Asks on stderr and reads a line from stdin. Anything but `y`/`yes` is a no.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        let yes = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
        tracing::info!(prompt, answer = yes, "[CONFIRM] Operator answered");
        yes
    }
}

/// Picks the (year, month) to work on from the dated files in the inbox.
///
/// With `assume_yes` (or a single candidate) the most recent month is taken without
/// asking.
pub fn choose_partition(inbox: &Path, assume_yes: bool) -> Result<YearMonth> {
    let found = detect_partitions(inbox)?;
    let Some(latest) = found.last().cloned() else {
        bail!(
            "No dated files found in {}; pass --year and --month explicitly",
            inbox.display()
        );
    };
    if assume_yes || found.len() == 1 {
        tracing::info!(partition = %latest, "[DETECT] Using most recent partition");
        return Ok(latest);
    }

    eprintln!("Partitions found in {}:", inbox.display());
    for (i, ym) in found.iter().enumerate() {
        eprintln!("  {:>3}) {ym}", i + 1);
    }
    eprint!("Choose one [{}]: ", found.len());
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    pick(&found, answer.trim())
}

fn pick(found: &[YearMonth], answer: &str) -> Result<YearMonth> {
    if answer.is_empty() {
        return found
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("No partitions to choose from"));
    }
    let index: usize = answer
        .parse()
        .map_err(|_| anyhow!("Not a number: {answer:?}"))?;
    index
        .checked_sub(1)
        .and_then(|i| found.get(i))
        .cloned()
        .ok_or_else(|| anyhow!("Choice {index} is out of range 1..={}", found.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: &str, month: &str) -> YearMonth {
        YearMonth {
            year: year.to_string(),
            month: month.to_string(),
        }
    }

    #[test]
    fn test_pick_defaults_to_latest_and_rejects_out_of_range() {
        let found = vec![ym("2023", "12"), ym("2024", "01")];
        assert_eq!(pick(&found, "").unwrap(), ym("2024", "01"));
        assert_eq!(pick(&found, "1").unwrap(), ym("2023", "12"));
        assert!(pick(&found, "0").is_err());
        assert!(pick(&found, "3").is_err());
        assert!(pick(&found, "abc").is_err());
    }
}
