//! Terminal output helpers. The pipelines narrate every step; violations
//! are colored by severity so a deny is unmissable in CI logs.

use std::io::{self, Write};

use colored::Colorize;
use infractl_policy::{Report, Severity};

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

pub fn step(msg: &str) {
    println!("{} {}", "→".bold(), msg);
}

/// Prints every violation, denials first, and a one-line summary.
pub fn print_report(report: &Report) {
    for v in &report.violations {
        let sev = match v.severity {
            Severity::Deny => "deny".red().bold(),
            Severity::Warn => "warn".yellow().bold(),
        };
        println!("  {sev} [{}] {}: {}", v.rule, v.address.bold(), v.message);
    }
    let denied = report.denials().count();
    let warned = report.warnings().count();
    if denied > 0 {
        error(&format!("policy check failed: {denied} violation(s), {warned} warning(s)"));
    } else if warned > 0 {
        info(&format!("policy check passed with {warned} warning(s)"));
    } else {
        success("policy check passed");
    }
}

/// `prompt (y/N)?` on stdout; anything but y/Y declines.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", format!("{prompt} (y/N)? ").yellow());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}
