//! Console output helpers.

use std::fmt::Display;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over `len` optimization stages.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print a command header.
pub fn print_header(title: &str) {
    println!("{} {}", style("→").cyan().bold(), style(title).bold());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}
