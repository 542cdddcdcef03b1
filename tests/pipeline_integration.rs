//! End-to-end library tests: analyze checkouts, persist, reload and render

use reference_finder::config::{ExecutionConfig, FinderConfig};
use reference_finder::model::{load_resources, save_resources, Repository};
use reference_finder::pipeline::{ExistingCheckout, Orchestrator};
use reference_finder::render::{build_flowchart, build_report, GroupDefinition, RenderOptions};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const PATTERN: &str = r"(?:http|https)://([a-zA-Z0-9-]+)(?:.dev|.demo){0,1}.service";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn repository(name: &str) -> Repository {
    Repository {
        url: format!("git@example.com:acme/{}.git", name),
        name: name.to_string(),
    }
}

/// A monorepo `platform` holding `gateway` and `catalog-api` (aliased to
/// `catalog`), next to a standalone `orders` repository
fn create_checkouts(workdir: &Path) {
    write(
        &workdir.join("platform/gateway/routes.yml"),
        "- http://orders.service\n- http://catalog.demo.service\n",
    );
    write(&workdir.join("platform/gateway/Dockerfile"), "FROM node:18\n");
    write(
        &workdir.join("platform/catalog-api/app.env"),
        "ORDERS=http://orders.service\n",
    );
    write(&workdir.join("platform/.github/ci.yml"), "http://gateway.service\n");
    write(&workdir.join("platform/LICENSE"), "MIT\n");
    write(
        &workdir.join("orders/src/app.yml"),
        "catalog: http://catalog-api.service\nself: http://orders.service\n",
    );
}

fn execution_config(workdir: &Path) -> ExecutionConfig {
    let mut aliases = HashMap::new();
    aliases.insert("catalog-api".to_string(), "catalog".to_string());

    let config = FinderConfig {
        reference_pattern: PATTERN.to_string(),
        root_like: vec!["platform".to_string()],
        extended_search: true,
        aliases,
        workdir: workdir.to_path_buf(),
        concurrency: 2,
        ..Default::default()
    };

    ExecutionConfig::from_parts(&config, vec![repository("platform"), repository("orders")]).unwrap()
}

#[tokio::test]
async fn test_analyze_persist_and_render() {
    let dir = TempDir::new().unwrap();
    let workdir = dir.path().join("workdir");
    create_checkouts(&workdir);

    let config = execution_config(&workdir);
    let resources = Orchestrator::new(config, Arc::new(ExistingCheckout::new(&workdir)))
        .execute()
        .await
        .unwrap();

    let tags: Vec<&str> = resources.iter().map(|r| r.tag.as_str()).collect();
    assert_eq!(tags, vec!["catalog", "gateway", "orders"]);

    let orders = &resources[2];
    assert_eq!(orders.references["catalog"], vec!["/orders/src/app.yml:1"]);
    assert!(!orders.references.contains_key("orders"));
    assert_eq!(resources[1].software, vec!["Node 18"]);

    let output = dir.path().join("output.json");
    save_resources(&output, &resources).unwrap();
    let reloaded = load_resources(&output).unwrap();
    assert_eq!(reloaded, resources);

    let options = RenderOptions {
        groups: vec![GroupDefinition {
            name: "Storefront".to_string(),
            members: vec!["gateway".to_string(), "catalog".to_string()],
        }],
        ..Default::default()
    };

    let chart = build_flowchart(&reloaded, None, &options, true);
    assert!(chart.contains("\t\tgateway ---> catalog\n"));
    assert!(chart.contains("\tgateway ---> orders\n"));
    assert!(chart.contains("\tcatalog ---> orders\n"));
    assert!(chart.contains("\torders ---> catalog\n"));
    assert!(!chart.contains("Orphan Center"));

    let focused = build_flowchart(&reloaded, Some("orders"), &RenderOptions::default(), false);
    assert!(!focused.contains("gateway ---> catalog"));
    assert!(focused.contains("gateway ---> orders"));

    let report = build_report(&reloaded, &options);
    assert!(report.starts_with("## gateway\n"));
    assert!(report.contains("### Team: Storefront"));
}

#[tokio::test]
async fn test_rerun_over_same_checkouts_is_stable() {
    let dir = TempDir::new().unwrap();
    let workdir = dir.path().join("workdir");
    create_checkouts(&workdir);

    let first = Orchestrator::new(
        execution_config(&workdir),
        Arc::new(ExistingCheckout::new(&workdir)),
    )
    .execute()
    .await
    .unwrap();
    let second = Orchestrator::new(
        execution_config(&workdir),
        Arc::new(ExistingCheckout::new(&workdir)),
    )
    .execute()
    .await
    .unwrap();

    assert_eq!(first, second);
}
