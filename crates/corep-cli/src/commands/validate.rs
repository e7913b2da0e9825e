use std::path::{Path, PathBuf};

use anyhow::Context;
use corep_schema::Payload;
use corep_validation::{DataQualityDetector, Validator};

pub(crate) fn run(
    template_files: &[PathBuf],
    template_id: &str,
    payload_path: &Path,
    json: bool,
) -> anyhow::Result<bool> {
    let registry = super::registry(template_files)?;
    let template = registry.get_template(template_id)?;
    let payload = Payload::from_json(template_id, &super::read_json(payload_path)?)
        .with_context(|| format!("invalid payload in {}", payload_path.display()))?;

    let result = Validator::new().validate(&payload, &template);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.is_valid());
    }

    let quality = DataQualityDetector::new().assess(&payload, &template);
    println!("Template:     {} ({})", template.name(), template.id());
    println!("Valid:        {}", if result.is_valid() { "yes" } else { "no" });
    println!("Completeness: {:.1}%", result.completeness() * 100.0);
    println!("Consistency:  {:.1}%", result.consistency() * 100.0);

    if !quality.missing.is_empty() {
        println!("Missing:      {}", quality.missing.join(", "));
    }
    for issue in result.field_issues() {
        let marker = if issue.is_error() { "x" } else { "!" };
        println!("  {marker} {issue}");
    }
    for issue in result.rule_issues() {
        let marker = if issue.is_violation() { "x" } else { "-" };
        println!("  {marker} {issue}");
    }

    Ok(result.is_valid())
}
