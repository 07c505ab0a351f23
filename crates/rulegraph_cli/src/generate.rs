//! Implementation of the `rulegraph generate` command.

use rulegraph_config::load_config;
use rulegraph_gen::{
    FinishReport, GenerateReport, GraphGenerator, ProjectManifest, Session, StarlarkRenderer,
    WriteStatus,
};
use tracing::debug;

use crate::pipeline::{resolve_project_root, DEFAULT_MANIFEST};
use crate::{GenerateArgs, GlobalArgs};

/// Runs generation for the project and returns the process exit code.
///
/// Every module that can be generated is written even if others fail; the
/// exit code is 1 if any module or shared file failed.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let mut config = load_config(&root)?;
    if let Some(jobs) = args.jobs {
        config.generate.jobs = jobs;
    }

    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_MANIFEST));
    debug!(root = %root.display(), manifest = %manifest_path.display(), "generate");
    let manifest = ProjectManifest::load(&manifest_path)?;

    let session = Session::open(&root, config);
    let report = GraphGenerator::new(&session, StarlarkRenderer::new()).generate(&manifest)?;
    let finish = session.finish()?;

    for failed in report.failed() {
        if let Err(e) = &failed.outcome {
            eprintln!("error: module '{}': {e}", failed.module);
        }
    }
    if !global.quiet {
        println!("{}", summary(&report, &finish));
    }

    Ok(if report.is_success() { 0 } else { 1 })
}

/// One-line run summary.
fn summary(report: &GenerateReport, finish: &FinishReport) -> String {
    let mut written = 0;
    let mut unchanged = 0;
    for r in report.modules.iter().chain(report.shared.iter()) {
        match r.outcome.as_ref().map(|f| f.status) {
            Ok(WriteStatus::Written) => written += 1,
            Ok(WriteStatus::Unchanged) => unchanged += 1,
            Ok(WriteStatus::Skipped) | Err(_) => {}
        }
    }
    let mut line = format!(
        "{} modules: {written} written, {unchanged} unchanged, {} failed",
        report.modules.len(),
        report.failed().count()
    );
    if !finish.removed_build_files.is_empty() {
        line.push_str(&format!(", {} stale removed", finish.removed_build_files.len()));
    }
    if finish.pruned_blobs > 0 {
        line.push_str(&format!(", {} blobs pruned", finish.pruned_blobs));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn global(root: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            project_root: Some(root.to_path_buf()),
        }
    }

    fn args() -> GenerateArgs {
        GenerateArgs {
            manifest: None,
            jobs: Some(2),
        }
    }

    #[test]
    fn generate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_MANIFEST),
            r#"{"modules": [{"path": ":app", "targets": [{"variant": "main",
                "scopes": {"main": {"sources": ["src/main/java/App.java"]}}}]}]}"#,
        )
        .unwrap();

        let code = run(&args(), &global(dir.path())).unwrap();
        assert_eq!(code, 0);
        let buck = fs::read_to_string(dir.path().join("app/BUCK")).unwrap();
        assert!(buck.contains("name = \"src_main\""));
    }

    #[test]
    fn failed_module_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_MANIFEST),
            r#"{"modules": [
                {"path": "ok", "targets": [{"variant": "main"}]},
                {"path": "broken", "targets": [{"variant": "main", "scopes": {"main": {
                    "external": [{"coordinate": {"group": "g", "name": "n", "version": "1"},
                                  "file": "missing.jar"}]}}}]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(run(&args(), &global(dir.path())).unwrap(), 1);
        assert!(dir.path().join("ok/BUCK").exists());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&args(), &global(dir.path())).unwrap_err();
        assert!(err.to_string().contains("rulegraph.json"));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rulegraph.toml"), "[paths]\nbuild_file = \"\"\n").unwrap();
        fs::write(dir.path().join(DEFAULT_MANIFEST), r#"{"modules": []}"#).unwrap();
        assert!(run(&args(), &global(dir.path())).is_err());
    }

    #[test]
    fn summary_line() {
        let report = GenerateReport::default();
        let finish = FinishReport {
            removed_build_files: vec!["old/BUCK".to_string()],
            pruned_blobs: 3,
        };
        assert_eq!(
            summary(&report, &finish),
            "0 modules: 0 written, 0 unchanged, 0 failed, 1 stale removed, 3 blobs pruned"
        );
    }
}
