use {
    anyhow::Result,
    playbook_registry::{LoadReport, Severity},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(
    result: playbook_registry::Result<LoadReport>,
    verbose: bool,
    deny_warnings: bool,
) -> Result<()> {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} {e}");
            eprintln!("\nregistry failed to load");
            std::process::exit(1);
        },
    };

    let mut shown = 0;
    for d in &report.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        let color = match d.severity {
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };
        eprintln!(
            "  {BOLD}{color}{}{RESET} {}: {}",
            d.severity,
            d.path.display(),
            d.message
        );
        shown += 1;
    }
    if shown > 0 {
        eprintln!();
    }

    let warnings = report.count(Severity::Warning);
    eprintln!(
        "{} collection(s), {} document(s), {warnings} warning(s)",
        report.registry.len(),
        report.registry.document_count()
    );

    if deny_warnings && warnings > 0 {
        std::process::exit(1);
    }
    Ok(())
}
