use std::io::{self, Write};
use std::sync::Mutex;

use tracing::warn;

use crate::engine::AnnealStatus;
use crate::set::SetType;

/// Terminal Hamiltonian of one set, tagged by its coupling role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetReport {
    pub set_type: SetType,
    pub hamiltonian: f64,
}

/// Terminal state of one completed annealing run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_index: usize,
    pub start_temperature: f64,
    pub sets: Vec<SetReport>,
    /// Terminal spin values per set; archival, not part of the line format.
    pub spins: Vec<Vec<f64>>,
    /// Total sweeps across the whole temperature schedule.
    pub steps: u64,
    pub status: AnnealStatus,
}

/// Destination for completed-run results.
///
/// Implementations are shared across worker threads, so any interior state
/// must be synchronized; a sink is the only shared mutable resource in the
/// whole scheduler.
pub trait ReportSink: Send + Sync {
    /// Archival dump of a run's initial spins. Default: discarded.
    fn run_started(&self, _run_index: usize, _start_temperature: f64, _spins: &[Vec<f64>]) {}

    fn run_finished(&self, report: &RunReport);
}

/// Mutex-guarded line writer: one formatted line per completed run, so
/// concurrent completions never interleave partial writes.
///
/// Line format follows the historical console output: start temperature,
/// then each set's Hamiltonian — `<h>` for Independent, `(h)` for NoAnneal,
/// bare for Dependent — then the step count.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(&self, line: &str) {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(writer, "{line}") {
            warn!(%err, "failed to write run report");
        }
    }
}

pub fn format_report(report: &RunReport) -> String {
    use std::fmt::Write as _;

    let mut line = format!("{}", report.start_temperature);
    for set in &report.sets {
        match set.set_type {
            SetType::Independent => {
                let _ = write!(line, " <{}>", set.hamiltonian);
            }
            SetType::NoAnneal => {
                let _ = write!(line, " ({})", set.hamiltonian);
            }
            SetType::Dependent => {
                let _ = write!(line, " {}", set.hamiltonian);
            }
        }
    }
    let _ = write!(line, " [{} steps]", report.steps);
    if report.status == AnnealStatus::IterationCapReached {
        line.push_str(" (sweep cap reached)");
    }
    line
}

impl<W: Write + Send> ReportSink for WriterSink<W> {
    fn run_finished(&self, report: &RunReport) {
        self.write_line(&format_report(report));
    }
}

pub type ConsoleSink = WriterSink<io::Stdout>;

impl ConsoleSink {
    pub fn stdout() -> Self {
        WriterSink::new(io::stdout())
    }
}

/// Collects reports in memory; test and aggregation support.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<RunReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_reports(self) -> Vec<RunReport> {
        self.reports
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl ReportSink for MemorySink {
    fn run_finished(&self, report: &RunReport) {
        let mut reports = match self.reports.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        reports.push(report.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport {
            run_index: 0,
            start_temperature: 5.0,
            sets: vec![
                SetReport {
                    set_type: SetType::Independent,
                    hamiltonian: -1.5,
                },
                SetReport {
                    set_type: SetType::NoAnneal,
                    hamiltonian: 0.25,
                },
                SetReport {
                    set_type: SetType::Dependent,
                    hamiltonian: 2.0,
                },
            ],
            spins: vec![vec![1.0, -1.0], vec![0.25]],
            steps: 42,
            status: AnnealStatus::Converged,
        }
    }

    #[test]
    fn line_format_tags_set_types() {
        assert_eq!(format_report(&sample_report()), "5 <-1.5> (0.25) 2 [42 steps]");
    }

    #[test]
    fn cap_status_is_visible_in_line() {
        let mut report = sample_report();
        report.status = AnnealStatus::IterationCapReached;
        assert!(format_report(&report).ends_with("(sweep cap reached)"));
    }

    #[test]
    fn writer_sink_emits_one_line_per_run() {
        let sink = WriterSink::new(Vec::new());
        sink.run_finished(&sample_report());
        sink.run_finished(&sample_report());
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }
}
