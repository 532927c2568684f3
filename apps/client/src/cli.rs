//! Command-line surface: argument parsing and plain-text rendering of jobs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::job::{Job, JobStatus, JobSummary};

#[derive(Debug, Parser)]
#[command(
    name = "skillmatch",
    version,
    about = "Submit a resume against a job description and track the skill-match analysis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a resume PDF with a job description and wait for the result
    Analyze {
        /// Path to the resume PDF
        #[arg(long)]
        resume: PathBuf,

        /// Job description text
        #[arg(
            long,
            conflicts_with = "job_description_file",
            required_unless_present = "job_description_file"
        )]
        job_description: Option<String>,

        /// Read the job description from a file instead
        #[arg(long)]
        job_description_file: Option<PathBuf>,
    },

    /// Wait for an existing analysis to finish and print it
    Watch { id: String },

    /// List past analyses, newest first
    History {
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Page size (defaults to SKILLMATCH_PAGE_SIZE)
        #[arg(long)]
        limit: Option<u32>,

        /// Keep fetching until every page is loaded
        #[arg(long, conflicts_with = "offset")]
        all: bool,
    },

    /// Delete an analysis
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Short status badge for a history row.
pub fn status_badge(summary: &JobSummary) -> String {
    match (&summary.status, summary.match_score) {
        (JobStatus::Failed, _) => "Failed".to_string(),
        (JobStatus::Completed, Some(score)) => format!("{:.0}% match", score.round()),
        (JobStatus::Processing, _) => "Processing...".to_string(),
        _ => "Pending".to_string(),
    }
}

pub fn render_history_row(summary: &JobSummary) -> String {
    format!(
        "{}  {}  {:<14}  {}",
        summary.id,
        summary.created_at.format("%b %d, %Y %H:%M"),
        status_badge(summary),
        summary.summary_preview
    )
}

pub fn render_report(job: &Job) -> String {
    let mut out = format!("Analysis {}\n", job.id);
    let Some(report) = job.report() else {
        out.push_str(&format!("Status: {}\n", job.status()));
        return out;
    };

    out.push_str(&format!(
        "Match score: {:.0}% ({})\n",
        report.match_score.round(),
        report.band().label()
    ));

    out.push_str("Matched skills: ");
    if report.matched_skills.is_empty() {
        out.push_str("No matched skills found\n");
    } else {
        out.push_str(&format!("{}\n", report.matched_skills.join(", ")));
    }

    out.push_str("Missing skills: ");
    if report.missing_skills.is_empty() {
        out.push_str("No missing skills - great match!\n");
    } else {
        out.push_str(&format!("{}\n", report.missing_skills.join(", ")));
    }

    if !report.suggestions.is_empty() {
        out.push_str("Suggestions to improve your resume:\n");
        for (i, suggestion) in report.suggestions.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, suggestion));
        }
    }
    out
}
