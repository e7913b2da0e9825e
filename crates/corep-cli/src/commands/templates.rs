use std::path::PathBuf;

pub(crate) fn run(template_files: &[PathBuf], detailed: bool) -> anyhow::Result<bool> {
    let registry = super::registry(template_files)?;

    for (id, name) in registry.list_templates() {
        println!("{id:<24} {name}");
        if !detailed {
            continue;
        }
        let template = registry.get_template(&id)?;
        for field in template.fields() {
            let required = if field.required { "required" } else { "optional" };
            println!("    {:<32} {:<10} {required}", field.id, field.data_type.as_str());
        }
        for rule in template.rules() {
            println!("    {:<32} {} (tolerance {})", rule.id, rule.formula, rule.tolerance);
        }
    }
    Ok(true)
}
