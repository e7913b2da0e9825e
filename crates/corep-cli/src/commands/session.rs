use std::path::{Path, PathBuf};

use anyhow::Context;
use corep_core::{ReportingSession, ScenarioMapper, SessionConfig, StaticRuleSource};

pub(crate) struct RunArgs<'a> {
    pub(crate) template_files: &'a [PathBuf],
    pub(crate) config: Option<&'a Path>,
    pub(crate) template: Option<&'a str>,
    pub(crate) scenario: &'a Path,
    pub(crate) question: &'a str,
    pub(crate) audit_out: Option<&'a Path>,
    pub(crate) bundle_out: Option<&'a Path>,
}

pub(crate) fn run(args: &RunArgs<'_>) -> anyhow::Result<bool> {
    let registry = super::registry(args.template_files)?;

    let config = match (args.config, args.template) {
        (Some(path), _) => SessionConfig::load(path)?,
        (None, Some(template_id)) => SessionConfig::new(template_id),
        (None, None) => anyhow::bail!("either --config or --template is required"),
    };

    let scenario = super::read_json(args.scenario)?;
    let mut session = ReportingSession::new(config, registry)?;
    let bundle = session.process(
        args.question,
        &scenario,
        &StaticRuleSource::with_builtins(),
        &ScenarioMapper::new(),
    )?;

    println!("Session:  {}", bundle.session_id);
    println!("Report:   {} ({})", bundle.report_name, bundle.template.id());
    for (field_id, value) in bundle.payload.iter() {
        let confidence = bundle.confidence.get(field_id).copied().unwrap_or_default();
        println!("  {field_id:<32} {:>16}  {:>3.0}%", value.to_string(), confidence * 100.0);
    }
    for warning in &bundle.warnings {
        println!("  ! {warning}");
    }
    let summary = bundle.result.summary();
    println!(
        "Result:   {} ({} rule(s) violated, completeness {:.1}%)",
        if summary.is_valid { "valid" } else { "invalid" },
        summary.rules_violated,
        summary.completeness * 100.0
    );

    if let Some(path) = args.audit_out {
        session.audit().save(path)?;
        println!("Audit log written to {}", path.display());
    }
    if let Some(path) = args.bundle_out {
        std::fs::write(path, bundle.to_json()?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("Bundle written to {}", path.display());
    }

    Ok(summary.is_valid)
}
