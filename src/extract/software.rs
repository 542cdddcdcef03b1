//! Auxiliary detectors that label the technology stack of a scanned unit
//!
//! Detectors are keyed on the exact file name (never the path) and yield at
//! most one label per file. Raw values without a known label are surfaced
//! verbatim so gaps in the lookup tables show up in the output.

use regex::Regex;
use tracing::{debug, warn};

/// Base images mapped to the label they imply. An empty label marks an image
/// that is known but says nothing about the service's own stack.
const BASE_IMAGE_LABELS: &[(&str, &str)] = &[
    ("adoptopenjdk:11-jre-hotspot", "Java 11"),
    ("eclipse-temurin:17", "Java 17"),
    ("eclipse-temurin:17-jre", "Java 17"),
    ("eclipse-temurin:17-jdk", "Java 17"),
    ("eclipse-temurin:19-jre", "Java 19"),
    ("python:3", "Python 3"),
    ("node:14", "Node 14"),
    ("node:14-alpine", "Node 14"),
    ("node:16", "Node 16"),
    ("node:16-alpine", "Node 16"),
    ("node:16-buster-slim", "Node 16"),
    ("node:18", "Node 18"),
    ("golang:alpine", "Golang"),
    ("phlptp/units:webserver", "C++"),
    ("nginx:1", ""),
    ("alpine:latest", ""),
    ("sonarqube:9", ""),
    ("cypress/included:10", ""),
    ("cypress/included:12", ""),
    ("cypress/included:13", ""),
    ("continuumio/miniconda3:4", ""),
    ("ubuntu:18", ""),
    ("gradle:7", ""),
    ("debian:buster-slim", ""),
    ("postgres:13", ""),
];

/// A detector bound to one or more exact file names
pub trait SoftwareDetector: Send + Sync {
    fn name(&self) -> &str;

    fn file_names(&self) -> &[&'static str];

    /// Inspects the whole file and returns at most one label
    fn detect(&self, content: &str) -> Option<String>;
}

pub struct DockerfileDetector {
    from_re: Regex,
}

impl DockerfileDetector {
    pub fn new() -> Self {
        Self {
            from_re: Regex::new(r"FROM ([A-Za-z0-9/-]+:[A-Za-z0-9-]+)").expect("valid regex"),
        }
    }
}

impl Default for DockerfileDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDetector for DockerfileDetector {
    fn name(&self) -> &str {
        "dockerfile"
    }

    fn file_names(&self) -> &[&'static str] {
        &["Dockerfile"]
    }

    fn detect(&self, content: &str) -> Option<String> {
        let image = self.from_re.captures(content)?.get(1)?.as_str();

        match BASE_IMAGE_LABELS.iter().find(|(raw, _)| *raw == image) {
            Some((_, "")) => None,
            Some((_, label)) => Some(label.to_string()),
            None => {
                warn!(image, "Unknown base image, reporting it verbatim");
                Some(image.to_string())
            }
        }
    }
}

pub struct GradleDetector {
    spring_re: Regex,
    kotlin_re: Regex,
}

impl GradleDetector {
    pub fn new() -> Self {
        Self {
            spring_re: Regex::new(
                r#"(?:springBootVersion = '|org.springframework.boot"\) version ")([0-9A-Z.]+)"#,
            )
            .expect("valid regex"),
            kotlin_re: Regex::new(r#"(?:kotlin\("jvm"\) version "|kotlin_version = ')([0-9.]+)"#)
                .expect("valid regex"),
        }
    }
}

impl Default for GradleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDetector for GradleDetector {
    fn name(&self) -> &str {
        "gradle"
    }

    fn file_names(&self) -> &[&'static str] {
        &["build.gradle", "build.gradle.kts"]
    }

    fn detect(&self, content: &str) -> Option<String> {
        if let Some(version) = first_capture(&self.spring_re, content) {
            return Some(format!("Spring {}", version));
        }
        first_capture(&self.kotlin_re, content).map(|version| format!("Kotlin {}", version))
    }
}

pub struct PackageJsonDetector {
    dependency_re: Regex,
}

impl PackageJsonDetector {
    pub fn new() -> Self {
        Self {
            dependency_re: Regex::new(r#""(typescript|node|react|aws-cdk)": "([0-9A-Za-z.]+)""#)
                .expect("valid regex"),
        }
    }
}

impl Default for PackageJsonDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDetector for PackageJsonDetector {
    fn name(&self) -> &str {
        "package-json"
    }

    fn file_names(&self) -> &[&'static str] {
        &["package.json"]
    }

    fn detect(&self, content: &str) -> Option<String> {
        let cap = self.dependency_re.captures(content)?;
        let package = cap.get(1)?.as_str();
        let version = cap.get(2)?.as_str();
        Some(format!("{} {}", capitalize(package), version))
    }
}

fn first_capture<'a>(re: &Regex, content: &'a str) -> Option<&'a str> {
    re.captures(content)?.get(1).map(|m| m.as_str())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The fixed set of detectors run against every scanned file
pub struct SoftwareDetectors {
    detectors: Vec<Box<dyn SoftwareDetector>>,
}

impl SoftwareDetectors {
    pub fn new(detectors: Vec<Box<dyn SoftwareDetector>>) -> Self {
        Self { detectors }
    }

    pub fn with_defaults() -> Self {
        Self {
            detectors: vec![
                Box::new(DockerfileDetector::new()),
                Box::new(GradleDetector::new()),
                Box::new(PackageJsonDetector::new()),
            ],
        }
    }

    pub fn is_interesting(&self, file_name: &str) -> bool {
        self.detectors
            .iter()
            .any(|d| d.file_names().contains(&file_name))
    }

    pub fn detect(&self, file_name: &str, content: &str) -> Vec<String> {
        self.detectors
            .iter()
            .filter(|d| d.file_names().contains(&file_name))
            .filter_map(|d| {
                let label = d.detect(content)?;
                debug!(detector = d.name(), label = %label, "Detected software");
                Some(label)
            })
            .collect()
    }
}

impl Default for SoftwareDetectors {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        temurin_jre = { "eclipse-temurin:17-jre", Some("Java 17") },
        adoptopenjdk = { "adoptopenjdk:11-jre-hotspot", Some("Java 11") },
        python_minor_tag_truncated = { "python:3.10-slim", Some("Python 3") },
        node_alpine = { "node:16-alpine", Some("Node 16") },
        golang = { "golang:alpine", Some("Golang") },
        postgres = { "postgres:13", None },
    )]
    fn test_dockerfile_base_images(image: &str, expected: Option<&str>) {
        let detector = DockerfileDetector::new();
        let content = format!("FROM {}\n", image);
        assert_eq!(detector.detect(&content).as_deref(), expected);
    }

    #[test]
    fn test_dockerfile_known_image() {
        let detector = DockerfileDetector::new();
        let content = "FROM eclipse-temurin:17-jre\nCOPY app.jar /app.jar\n";
        assert_eq!(detector.detect(content), Some("Java 17".to_string()));
    }

    #[test]
    fn test_dockerfile_silent_image() {
        let detector = DockerfileDetector::new();
        assert_eq!(detector.detect("FROM nginx:1\n"), None);
    }

    #[test]
    fn test_dockerfile_unknown_image_is_verbatim() {
        let detector = DockerfileDetector::new();
        assert_eq!(
            detector.detect("FROM rust:1-slim\n"),
            Some("rust:1-slim".to_string())
        );
    }

    #[test]
    fn test_dockerfile_first_stage_wins() {
        let detector = DockerfileDetector::new();
        let content = "FROM node:18 AS build\nRUN npm ci\nFROM nginx:1\n";
        assert_eq!(detector.detect(content), Some("Node 18".to_string()));
    }

    #[test]
    fn test_gradle_spring_boot_version() {
        let detector = GradleDetector::new();
        let content = "ext {\n  springBootVersion = '2.7.2'\n  kotlin_version = '1.4.31'\n}\n";
        assert_eq!(detector.detect(content), Some("Spring 2.7.2".to_string()));
    }

    #[test]
    fn test_gradle_kts_plugin_version() {
        let detector = GradleDetector::new();
        let content = "plugins {\n  id(\"org.springframework.boot\") version \"3.1.0\"\n}\n";
        assert_eq!(detector.detect(content), Some("Spring 3.1.0".to_string()));
    }

    #[test]
    fn test_gradle_kotlin_only() {
        let detector = GradleDetector::new();
        let content = "plugins {\n  kotlin(\"jvm\") version \"1.9.10\"\n}\n";
        assert_eq!(detector.detect(content), Some("Kotlin 1.9.10".to_string()));
    }

    #[test]
    fn test_package_json_capitalizes() {
        let detector = PackageJsonDetector::new();
        let content = r#"{"dependencies": {"react": "18.2.0", "typescript": "4.9.5"}}"#;
        assert_eq!(detector.detect(content), Some("React 18.2.0".to_string()));
    }

    #[test]
    fn test_registry_matches_exact_file_name() {
        let detectors = SoftwareDetectors::with_defaults();

        assert!(detectors.is_interesting("Dockerfile"));
        assert!(detectors.is_interesting("build.gradle.kts"));
        assert!(!detectors.is_interesting("Dockerfile.dev"));
        assert!(!detectors.is_interesting("app.yml"));

        assert_eq!(
            detectors.detect("Dockerfile", "FROM node:16\n"),
            vec!["Node 16".to_string()]
        );
        assert!(detectors.detect("Dockerfile.dev", "FROM node:16\n").is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("aws-cdk"), "Aws-cdk");
        assert_eq!(capitalize(""), "");
    }
}
