//! Resource scanner: walks one scan unit and folds per-file matches into [`Findings`]

use crate::extract::{ReferenceExtractor, SoftwareDetectors};
use crate::model::{merge_references, unique, Findings, ReferenceMap};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, trace};

const VCS_METADATA_DIR: &str = ".git";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan root does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        source: ignore::Error,
    },
    #[error("Failed to read file {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },
}

/// Scans directory trees for references; shared read-only between workers
pub struct ResourceScanner {
    extractor: ReferenceExtractor,
    detectors: SoftwareDetectors,
    valid_names: HashSet<String>,
}

impl ResourceScanner {
    pub fn new(extractor: ReferenceExtractor) -> Self {
        Self {
            extractor,
            detectors: SoftwareDetectors::with_defaults(),
            valid_names: HashSet::new(),
        }
    }

    /// Restricts reference targets to `valid_names`; an empty set keeps everything
    pub fn with_valid_names(mut self, valid_names: HashSet<String>) -> Self {
        self.valid_names = valid_names;
        self
    }

    pub fn with_detectors(mut self, detectors: SoftwareDetectors) -> Self {
        self.detectors = detectors;
        self
    }

    fn accepts(&self, tag: &str) -> bool {
        self.valid_names.is_empty() || self.valid_names.contains(tag)
    }

    /// Visits every regular file under `root`. Any walk or read failure aborts
    /// the scan, since a partial tree would under-report dependencies.
    pub fn scan(&self, tag: &str, root: &Path) -> Result<Findings, ScanError> {
        if !root.exists() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }

        let start = Instant::now();
        let mut references = ReferenceMap::new();
        let mut software = Vec::new();
        let mut files_scanned = 0usize;

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(|entry| entry.file_name() != VCS_METADATA_DIR)
            .build();

        for result in walker {
            let entry = result.map_err(|source| ScanError::Walk {
                root: root.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let file_refs = self.scan_file(tag, path, &mut software)?;
            merge_references(&mut references, file_refs, |k| self.accepts(k));
            files_scanned += 1;
        }

        let findings = Findings {
            references,
            software: unique(software),
        };

        debug!(
            tag,
            root = %root.display(),
            files_scanned,
            references = findings.references.len(),
            software = findings.software.len(),
            empty = findings.is_empty(),
            scan_time_ms = start.elapsed().as_millis() as u64,
            "Scan unit complete"
        );

        Ok(findings)
    }

    fn scan_file(
        &self,
        tag: &str,
        path: &Path,
        software: &mut Vec<String>,
    ) -> Result<ReferenceMap, ScanError> {
        let bytes = fs::read(path).map_err(|source| ScanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let mut refs = ReferenceMap::new();
        for (index, line) in content.lines().enumerate() {
            for reference in self.extractor.extract_line(path, index + 1, line) {
                if reference.tag == tag {
                    continue;
                }
                trace!(tag = %reference.tag, location = %reference.location, "Reference found");
                refs.entry(reference.tag).or_default().push(reference.location);
            }
        }

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if self.detectors.is_interesting(file_name) {
                software.extend(self.detectors.detect(file_name, &content));
            }
        }

        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use tempfile::TempDir;

    fn scanner_for(root: &Path) -> ResourceScanner {
        let extractor = ReferenceExtractor::new(Regex::new(r"https?://([a-z0-9-]+)\.service").unwrap())
            .with_strip_prefix(root);
        ResourceScanner::new(extractor)
    }

    fn create_service(dir: &TempDir) -> PathBuf {
        let base = dir.path().join("orders");
        fs::create_dir_all(base.join("src/main/resources")).unwrap();
        fs::write(
            base.join("src/main/resources/application.yml"),
            "billing:\n  url: http://billing.service\nself: http://orders.service\nusers: https://users.service\n",
        )
        .unwrap();
        fs::write(
            base.join("src/main/resources/application-dev.yml"),
            "billing:\n  url: http://billing.service\n",
        )
        .unwrap();
        fs::write(base.join("Dockerfile"), "FROM eclipse-temurin:17-jre\n").unwrap();
        fs::write(
            base.join("build.gradle"),
            "ext {\n  springBootVersion = '2.7.2'\n}\n",
        )
        .unwrap();
        base
    }

    #[test]
    fn test_scan_collects_references_with_provenance() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        let scanner = scanner_for(dir.path());

        let findings = scanner.scan("orders", &root).unwrap();

        let billing = &findings.references["billing"];
        assert_eq!(billing.len(), 2);
        assert!(billing.contains(&"/orders/src/main/resources/application.yml:2".to_string()));
        assert!(billing.contains(&"/orders/src/main/resources/application-dev.yml:2".to_string()));
        assert_eq!(
            findings.references["users"],
            vec!["/orders/src/main/resources/application.yml:4"]
        );
    }

    #[test]
    fn test_scan_excludes_self_references() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        let scanner = scanner_for(dir.path());

        let findings = scanner.scan("orders", &root).unwrap();

        assert!(!findings.references.contains_key("orders"));
    }

    #[test]
    fn test_scan_detects_software_once() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        fs::create_dir_all(root.join("worker")).unwrap();
        fs::write(root.join("worker/Dockerfile"), "FROM eclipse-temurin:17\n").unwrap();
        let scanner = scanner_for(dir.path());

        let findings = scanner.scan("orders", &root).unwrap();

        let mut software = findings.software.clone();
        software.sort();
        assert_eq!(software, vec!["Java 17", "Spring 2.7.2"]);
    }

    #[test]
    fn test_scan_filters_by_valid_names() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        let scanner = scanner_for(dir.path())
            .with_valid_names(["orders", "billing"].iter().map(|s| s.to_string()).collect());

        let findings = scanner.scan("orders", &root).unwrap();

        assert!(findings.references.contains_key("billing"));
        assert!(!findings.references.contains_key("users"));
    }

    #[test]
    fn test_scan_visits_hidden_files_but_skips_git_metadata() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("orders");
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join(".github/workflows")).unwrap();
        fs::write(root.join(".git/config"), "url = https://vcs.service\n").unwrap();
        fs::write(
            root.join(".github/workflows/deploy.yml"),
            "target: https://deployer.service\n",
        )
        .unwrap();
        fs::write(root.join(".gitignore"), "*.env\n").unwrap();
        fs::write(root.join("local.env"), "API=http://gateway.service\n").unwrap();

        let findings = scanner_for(dir.path()).scan("orders", &root).unwrap();

        assert!(findings.references.contains_key("deployer"));
        assert!(findings.references.contains_key("gateway"));
        assert!(!findings.references.contains_key("vcs"));
    }

    struct MakefileDetector;

    impl crate::extract::SoftwareDetector for MakefileDetector {
        fn name(&self) -> &str {
            "makefile"
        }

        fn file_names(&self) -> &[&'static str] {
            &["Makefile"]
        }

        fn detect(&self, content: &str) -> Option<String> {
            content.contains("gcc").then(|| "C".to_string())
        }
    }

    #[test]
    fn test_scan_with_custom_detectors() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        fs::write(root.join("Makefile"), "all:\n\tgcc main.c\n").unwrap();

        let scanner = scanner_for(dir.path())
            .with_detectors(SoftwareDetectors::new(vec![Box::new(MakefileDetector)]));
        let findings = scanner.scan("orders", &root).unwrap();

        assert_eq!(findings.software, vec!["C"]);
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_for(dir.path());

        let result = scanner.scan("ghost", &dir.path().join("ghost"));
        assert!(matches!(result, Err(ScanError::RootNotFound(_))));
    }

    #[cfg(unix)]
    fn lock_down(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        // privileged users read through permission bits
        fs::read_dir(path).is_err() && fs::read(path).is_err()
    }

    #[cfg(unix)]
    fn unlock(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        let locked = root.join("src/main/resources");
        if !lock_down(&locked) {
            unlock(&locked, 0o755);
            return;
        }

        let result = scanner_for(dir.path()).scan("orders", &root);
        unlock(&locked, 0o755);

        assert!(matches!(result, Err(ScanError::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_file_is_error() {
        let dir = TempDir::new().unwrap();
        let root = create_service(&dir);
        let locked = root.join("Dockerfile");
        if !lock_down(&locked) {
            unlock(&locked, 0o644);
            return;
        }

        let result = scanner_for(dir.path()).scan("orders", &root);
        unlock(&locked, 0o644);

        match result {
            Err(ScanError::FileRead { path, .. }) => assert_eq!(path, locked),
            other => panic!("Expected FileRead error, got {:?}", other.map(|f| f.references)),
        }
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("empty");
        fs::create_dir(&root).unwrap();

        let findings = scanner_for(dir.path()).scan("empty", &root).unwrap();
        assert!(findings.is_empty());
    }
}
