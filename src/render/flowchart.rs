//! Mermaid flowchart rendering

use super::options::RenderOptions;
use crate::model::{unique, Resource};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

const HEADER: &str = "flowchart LR\n";
const ORPHAN_GROUP: &str = "Orphans";
const ORPHAN_SINK: &str = "c(Orphan Center)";

/// Group names reduced to ASCII alphanumerics and spaces, trimmed
fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

fn group_node(group: &str) -> String {
    format!("group-{}(\"`{}`\")", clean_name(group), group)
}

fn node(tag: &str, options: &RenderOptions) -> String {
    match options.translations.get(tag) {
        Some(label) => format!("{}(\"`{}`\")", tag, label),
        None => tag.to_string(),
    }
}

fn edge(from: &str, to: &str) -> String {
    format!("{} ---> {}\n", from, to)
}

fn subgraph(out: &mut String, title: &str, entries: &[String]) {
    out.push_str(&format!("\tsubgraph \"`{}`\"\n", clean_name(title)));
    for entry in entries {
        out.push_str("\t\t");
        out.push_str(entry);
    }
    out.push_str("\tend\n");
}

/// Renders the resource graph as a Mermaid flowchart
///
/// With `focus` set only edges touching that tag are drawn; orphan detection
/// still considers every filtered edge. Edges between two members of the same
/// group are drawn inside that group's block.
pub fn build_flowchart(
    resources: &[Resource],
    focus: Option<&str>,
    options: &RenderOptions,
    include_orphans: bool,
) -> String {
    let mut grouped: HashMap<&str, Vec<String>> = HashMap::new();
    let mut ungrouped = Vec::new();
    let mut connected = BTreeSet::new();
    let mut candidates = BTreeSet::new();

    let in_focus = |tag: &str| focus.map_or(true, |f| f == tag);

    for resource in resources {
        let source = resource.tag.as_str();
        if !options.passes(source) {
            continue;
        }
        candidates.insert(source);

        let source_group = options.group_of(source);
        if let Some(group) = source_group {
            if in_focus(source) {
                grouped
                    .entry(group.name.as_str())
                    .or_default()
                    .push(edge(&group_node(&group.name), &node(source, options)));
            }
        }

        for dep in resource.references.keys() {
            if !options.passes(dep) {
                continue;
            }
            connected.insert(source);
            connected.insert(dep.as_str());

            if !in_focus(source) && !in_focus(dep) {
                continue;
            }

            let dep_group = options.group_of(dep);
            if let Some(group) = dep_group {
                grouped
                    .entry(group.name.as_str())
                    .or_default()
                    .push(edge(&group_node(&group.name), &node(dep, options)));
            }

            let line = edge(&node(source, options), &node(dep, options));
            match (source_group, dep_group) {
                (Some(a), Some(b)) if a.name == b.name => {
                    grouped.entry(a.name.as_str()).or_default().push(line)
                }
                _ => ungrouped.push(line),
            }
        }
    }

    let mut out = String::from(HEADER);

    for group in &options.groups {
        if let Some(entries) = grouped.remove(group.name.as_str()) {
            subgraph(&mut out, &group.name, &unique(entries));
        }
    }

    for line in unique(ungrouped) {
        out.push('\t');
        out.push_str(&line);
    }

    let orphans: Vec<&str> = candidates.difference(&connected).copied().collect();
    for orphan in &orphans {
        info!(tag = %orphan, "Orphan found");
    }

    if include_orphans && !orphans.is_empty() {
        let entries: Vec<String> = orphans
            .iter()
            .map(|tag| edge(&node(tag, options), ORPHAN_SINK))
            .collect();
        subgraph(&mut out, ORPHAN_GROUP, &entries);
    }

    out
}
