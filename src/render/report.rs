//! Markdown report ordered by how much each resource has to say

use super::options::RenderOptions;
use crate::model::Resource;
use std::fmt::Write as _;
use tracing::debug;

struct Section {
    priority: usize,
    body: String,
}

fn bullet_block(out: &mut String, heading: &str, items: &[&str]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "### {}:\n", heading);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
    out.push_str("\n\n");
}

fn section(resource: &Resource, options: &RenderOptions) -> Section {
    let mut body = format!("## {}\n\n", options.label(&resource.tag));

    let teams: Vec<&str> = options
        .groups_containing(&resource.tag)
        .map(|g| g.name.as_str())
        .collect();
    for team in &teams {
        let _ = writeln!(body, "### Team: {}\n", team);
    }

    let software: Vec<&str> = resource.software.iter().map(String::as_str).collect();
    bullet_block(&mut body, "Software", &software);

    let dependencies: Vec<&str> = resource
        .references
        .keys()
        .map(String::as_str)
        .filter(|dep| options.passes(dep))
        .collect();
    bullet_block(&mut body, "Dependencies", &dependencies);

    Section {
        priority: teams.len() + software.len() + dependencies.len(),
        body,
    }
}

/// Renders one section per resource passing the filters, highest priority
/// first; equal priorities keep input order
pub fn build_report(resources: &[Resource], options: &RenderOptions) -> String {
    let mut sections: Vec<Section> = resources
        .iter()
        .filter(|r| options.passes(&r.tag))
        .map(|r| {
            let section = section(r, options);
            debug!(tag = %r.tag, priority = section.priority, "Adding to report");
            section
        })
        .collect();

    sections.sort_by(|a, b| b.priority.cmp(&a.priority));
    sections.into_iter().map(|s| s.body).collect()
}
