use serde_json::json;

use crate::cli::output::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::resources::{self, ResourceSummary, RESOURCES};

pub fn handle(segment: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let summaries: Vec<ResourceSummary> = match segment {
        Some(segment) => {
            let def = resources::find(segment).ok_or_else(|| anyhow::anyhow!("unknown resource '{}'", segment))?;
            vec![def.summary()]
        }
        None => RESOURCES.iter().map(|def| def.summary()).collect(),
    };

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            &format!("{} resources", summaries.len()),
            Some(json!({ "resources": summaries })),
        ),
        OutputFormat::Text => {
            for summary in &summaries {
                println!("/api/{} ({})", summary.segment, summary.collection);
                let writers = if summary.write_roles.is_empty() {
                    "any member".to_string()
                } else {
                    summary.write_roles.join(", ")
                };
                output_table(&[
                    ("fields".to_string(), summary.fields.join(", ")),
                    ("required".to_string(), summary.required.join(", ")),
                    ("updatable".to_string(), summary.updatable.join(", ")),
                    ("filters".to_string(), summary.filterable.join(", ")),
                    ("sort".to_string(), summary.sortable.join(", ")),
                    ("writers".to_string(), writers),
                    ("delete".to_string(), summary.allow_delete.to_string()),
                ]);
                println!();
            }
            Ok(())
        }
    }
}
