use std::path::Path;

use corep_audit::AuditLog;

pub(crate) fn run(path: &Path, top: usize) -> anyhow::Result<bool> {
    let log = match AuditLog::load(path) {
        Ok(log) => log,
        Err(e) if e.is_tampering() => {
            tracing::warn!(path = %path.display(), error = %e, "audit log failed verification");
            println!("Audit log integrity: INVALID");
            println!("  {e}");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let header = log.header();
    println!("Audit log integrity: VALID");
    println!("Session:  {}", header.session_id);
    println!("Report:   {} ({})", header.report_name, header.template_id);
    println!("Created:  {}", header.created_at.to_rfc3339());
    println!("Entries:  {}", log.len());

    let totals = log.validation_summary();
    println!("Validation runs: {} passed, {} failed", totals.passed, totals.failed);

    let references = log.top_references(top);
    if !references.is_empty() {
        println!("Most cited references:");
        for (reference, count) in references {
            println!("  {count:>4}  {reference}");
        }
    }
    Ok(true)
}
