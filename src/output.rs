use std::io::{self, Write};

use serde::Serialize;

use crate::aggregate::to_gigabytes;
use crate::app::{
    BatchStatus, CollectResult, DownloadPlan, ProgressEvent, ProgressSink, SubmitResult,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

#[derive(Serialize)]
struct CollectAndSubmit<'a> {
    collect: &'a CollectResult,
    submit: &'a SubmitResult,
}

impl JsonOutput {
    pub fn print_collect(result: &CollectResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_plan(plan: &DownloadPlan) -> io::Result<()> {
        Self::print_json(plan)
    }

    pub fn print_submit(result: &SubmitResult) -> io::Result<()> {
        Self::print_json(result)
    }

    /// One document for `collect --submit`, so stdout stays a single JSON value.
    pub fn print_collect_and_submit(
        collect: &CollectResult,
        submit: &SubmitResult,
    ) -> io::Result<()> {
        Self::print_json(&CollectAndSubmit { collect, submit })
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress on stderr and summaries on stdout.
pub struct ConsoleOutput;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

impl ConsoleOutput {
    pub fn print_collect(result: &CollectResult) {
        let found = result.records.len() - result.unavailable();
        println!("{CYAN}JGI portal summary{RESET}");
        println!("{GREEN}Taxa with portal data: {found}{RESET}");
        if result.unavailable() > 0 {
            println!(
                "{YELLOW}Taxa without portal data: {}{RESET}",
                result.unavailable()
            );
        }
        for entry in &result.records {
            let color = if entry.available { GREEN } else { YELLOW };
            println!(
                "{color}  {} {} (bins: {}){RESET}",
                entry.taxon_oid,
                entry.record.jamo_id,
                entry.record.bin_count()
            );
        }
    }

    pub fn print_plan(plan: &DownloadPlan) {
        println!(
            "{CYAN}{} files, estimated size {:.2} GB{RESET}",
            plan.file_count, plan.total_gb
        );
        if plan.split {
            println!(
                "{YELLOW}Above the size threshold: {} batches{RESET}",
                plan.batches.len()
            );
        }
        for (index, batch) in plan.batches.iter().enumerate() {
            println!(
                "  batch {}: {} files, {:.2} GB",
                index + 1,
                batch.len(),
                to_gigabytes(batch.bytes)
            );
        }
    }

    pub fn print_submit(result: &SubmitResult) {
        println!(
            "{CYAN}Restore requests: {} submitted, {} failed, {} total{RESET}",
            result.submitted(),
            result.failed(),
            result.batches.len()
        );
        for outcome in &result.batches {
            match &outcome.status {
                BatchStatus::Submitted { http_status } => println!(
                    "{GREEN}  batch {}: {} files submitted (HTTP {http_status}){RESET}",
                    outcome.index + 1,
                    outcome.file_count
                ),
                BatchStatus::Declined => println!(
                    "{YELLOW}  batch {}: declined{RESET}",
                    outcome.index + 1
                ),
                BatchStatus::Failed { message } => println!(
                    "{RED}  batch {}: failed: {message}{RESET}",
                    outcome.index + 1
                ),
            }
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} latency_ms={}", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
