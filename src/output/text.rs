//! Human-readable text output

use crate::config::OutputConfig;
use crate::coordinator::RunReport;
use crate::util::resource::ResourceSnapshot;
use crate::util::time::{elements_per_sec, format_duration, format_number};
use std::fmt::Write;

/// Print run results to console
///
/// Displays:
/// - Input size and worker counts (with clamping, if any)
/// - Per-worker ranges and partial sums (unless disabled)
/// - Final total
/// - Wall-clock and CPU time of the parallel section
pub fn print_results(report: &RunReport, output: &OutputConfig) {
    if output.quiet {
        println!("{}", report.total);
        return;
    }
    print!("{}", render_results(report, output.per_worker));
}

/// Render the text report
pub fn render_results(report: &RunReport, per_worker: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_results(&mut out, report, per_worker);
    out
}

fn write_results(out: &mut String, report: &RunReport, per_worker: bool) -> std::fmt::Result {
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out, "                    REDUCTION RESULTS")?;
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out)?;

    writeln!(out, "Input:     {} ({} values)", report.source, format_number(report.elements as i64))?;
    if report.clamped() {
        writeln!(
            out,
            "Workers:   {} (requested {}, clamped to element count)",
            report.effective_workers, report.requested_workers
        )?;
    } else {
        writeln!(out, "Workers:   {}", report.effective_workers)?;
    }
    writeln!(out, "Transport: {}", report.transport)?;
    writeln!(out)?;

    if per_worker {
        writeln!(out, "Partial sums:")?;
        for (partial, range) in report.partials.iter().zip(&report.partitions) {
            writeln!(
                out,
                "  Worker {:>3}  indices {:>10} .. {:<10}  sum {}",
                partial.worker_index,
                range.start,
                range.end.saturating_sub(1),
                format_number(partial.sum)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Total: {}", format_number(report.total))?;
    writeln!(out)?;

    let timing = &report.timing;
    writeln!(out, "Timing (dispatch through aggregation):")?;
    writeln!(
        out,
        "  Wall:   {} ({:.0} values/s)",
        format_duration(timing.wall),
        elements_per_sec(report.elements, timing.wall)
    )?;
    writeln!(
        out,
        "  CPU:    {} user + {} system",
        format_duration(timing.cpu_user),
        format_duration(timing.cpu_system)
    )?;
    writeln!(
        out,
        "          {:.0}% of one core ({} cores available)",
        timing.cpu_percent(),
        ResourceSnapshot::num_cpus()
    )?;
    writeln!(out, "═══════════════════════════════════════════════════════════")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PartialResult;
    use crate::config::TransportKind;
    use crate::partition::Partition;
    use crate::util::resource::RunTiming;
    use std::time::Duration;

    fn sample_report(requested_workers: usize) -> RunReport {
        RunReport {
            source: "input.txt".to_string(),
            elements: 4,
            total: 50,
            requested_workers,
            effective_workers: 2,
            transport: TransportKind::Memory,
            partitions: vec![Partition::new(0, 2), Partition::new(2, 4)],
            partials: vec![
                PartialResult { worker_index: 0, sum: 15 },
                PartialResult { worker_index: 1, sum: 35 },
            ],
            timing: RunTiming {
                wall: Duration::from_millis(2),
                cpu_user: Duration::from_micros(900),
                cpu_system: Duration::from_micros(100),
            },
        }
    }

    #[test]
    fn test_render_includes_partials_and_total() {
        let text = render_results(&sample_report(2), true);
        assert!(text.contains("Total: 50"));
        assert!(text.contains("sum 15"));
        assert!(text.contains("sum 35"));
        assert!(text.contains("Workers:   2\n"));
        assert!(text.contains("Wall:   2.00ms"));
    }

    #[test]
    fn test_render_without_per_worker_table() {
        let text = render_results(&sample_report(2), false);
        assert!(!text.contains("Partial sums:"));
        assert!(text.contains("Total: 50"));
    }

    #[test]
    fn test_render_reports_clamping() {
        let text = render_results(&sample_report(8), true);
        assert!(text.contains("requested 8, clamped"));
    }
}
