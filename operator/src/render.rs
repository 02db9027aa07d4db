use mstrcore::analysis::{DashboardStats, JobReport};
use mstrcore::ingest::UploadError;
use mstrcore::model::{File, Job};
use mstrcore::tracking::Snapshot;
use std::fmt::Write;

pub fn dashboard(stats: &DashboardStats) -> String {
    format!(
        "files {} | completed jobs {} | detections {} | avg confidence {}%",
        stats.files,
        stats.completed_jobs,
        stats.total_detections,
        (stats.average_confidence * 100.0).round() as i64
    )
}

pub fn jobs(snapshot: &Snapshot) -> String {
    if snapshot.jobs().is_empty() {
        return "no analysis jobs yet".into();
    }
    let mut out = String::new();
    for job in snapshot.jobs() {
        let _ = writeln!(out, "{}", job_line(job));
    }
    out.trim_end().to_string()
}

pub fn job_line(job: &Job) -> String {
    let mut line = format!(
        "{} {:<10} {} file(s) {}",
        job.id,
        job.status,
        job.file_ids.len(),
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(results) = job.detections() {
        let _ = write!(line, " -> {} target(s)", results.len());
    }
    line
}

pub fn report(report: &JobReport) -> String {
    let mut out = format!(
        "job {} over {} file(s): {} detection(s), avg confidence {}% (high {}, medium {}, low {})\n",
        report.job_id,
        report.file_count,
        report.summary.count,
        (report.summary.average_confidence * 100.0).round() as i64,
        report.tiers.high,
        report.tiers.medium,
        report.tiers.low
    );
    for view in &report.detections {
        let (x, y) = view.position_percent;
        let _ = writeln!(
            out,
            "  {} {:<16} at ({x}%, {y}%) {:>3}% [{}]",
            view.glyph, view.target_type, view.confidence_percent, view.tier
        );
    }
    out.trim_end().to_string()
}

pub fn uploads(results: &[Result<File, UploadError>]) -> String {
    results
        .iter()
        .map(|result| match result {
            Ok(file) => format!("uploaded {} as {} [{}]", file.filename, file.id, file.file_type),
            Err(err) => err.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
