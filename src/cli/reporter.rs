// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::geometry::MeshStats;
use crate::split::SplitSummary;
use crate::weld::WeldSummary;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a finished weld
    pub fn report_weld(file: &str, summary: &WeldSummary, duration: Duration) {
        Self::header("Welded:", file);
        Self::print_count("Regions", summary.regions);
        Self::print_count("Merged edges", summary.merged_edges);
        Self::print_count("Removed vertices", summary.removed_vertices);
        Self::print_count("Removed edges", summary.removed_edges);
        Self::print_count("Removed faces", summary.removed_faces);
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "Removed {} vertices and {} edges.",
            summary.removed_vertices, summary.removed_edges
        );
    }

    /// Report a finished intersection search
    pub fn report_split(file: &str, summary: &SplitSummary, duration: Duration) {
        Self::header("Split:", file);
        Self::print_count("Segments", summary.segments);
        Self::print_count("Intersected edges", summary.intersected_edges);
        Self::print_count("Intersected faces", summary.intersected_faces);
        if summary.debug_cylinders > 0 {
            Self::print_count("Marker cylinders", summary.debug_cylinders);
        }
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report mesh statistics, flagging open or broken meshes
    pub fn report_stats(file: &str, stats: &MeshStats) {
        Self::header("Mesh:", file);
        stats.print();

        if !stats.is_consistent() {
            let reason = stats.consistency_error.as_deref().unwrap_or("unknown");
            Self::report_warning(&format!("Mesh adjacency is inconsistent: {reason}"));
        } else if stats.boundary_edge_count > 0 {
            Self::report_info(&format!("{} open edges", stats.boundary_edge_count));
        } else {
            Self::success("Mesh is closed");
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn header(label: &str, file: &str) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", label.bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
    }

    fn print_count(name: &str, value: usize) {
        let formatted = if value == 0 {
            value.to_string().bright_black()
        } else {
            value.to_string().cyan()
        };
        println!("  {} {}", format!("{name}:").bright_black(), formatted);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
