//! Source discovery, per-file metrics and component aggregation
//!
//! The COLLECT phase of a run:
//!
//! 1. walk the project root (respecting `.gitignore` and `.archgateignore`)
//! 2. find component directories
//! 3. measure and price every file on a bounded worker pool
//! 4. reduce file costs into components, single-threaded and in sorted order

pub mod cost;
pub mod metrics;

pub use cost::{dominant_phase, file_kind, path_words, phase, CostCalculator, PricedFile};
pub use metrics::{CollectError, CommentStyle, FileMetricsCollector};

use crate::config::{ExcludeConfig, GovernanceConfig};
use crate::error::GovernanceError;
use crate::models::{round_to, ComponentCost, FileKind, FileMetrics};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Supported source file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "c", "h", // C
    "cpp", "cc", "cxx", "hpp", "hh", "hxx", // C++
    "m", "mm", // Objective-C
    "rs", // Rust
    "go", // Go
    "java", // Java
    "kt", "kts", // Kotlin
    "cs",  // C#
    "py", "pyi", // Python
    "js", "jsx", "mjs", "ts", "tsx", // JavaScript / TypeScript
    "rb",    // Ruby
    "php",   // PHP
    "swift", // Swift
];

/// Project-local ignore file, same syntax as `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".archgateignore";

/// Worker and progress settings for the COLLECT phase
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub workers: usize,
    pub show_progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            show_progress: false,
        }
    }
}

/// Output of the COLLECT phase
#[derive(Debug, Clone)]
pub struct CollectionResult {
    /// Every discovered file, priced, in sorted path order
    pub files: Vec<PricedFile>,
    /// Components in sorted path order
    pub components: Vec<ComponentCost>,
    /// Files read and measured successfully
    pub files_processed: usize,
    /// Files counted as zero cost because they could not be read
    pub files_failed: usize,
}

/// Project-relative, `/`-separated form of `path`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// All supported source files under `root`, sorted.
pub fn discover_files(root: &Path, exclude: &ExcludeConfig) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME);

    let mut files: Vec<PathBuf> = builder
        .build()
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(path))
        .filter(|path| {
            let rel = relative_path(root, path);
            let excluded = exclude.is_excluded(&rel);
            if excluded {
                debug!("Excluded {}", rel);
            }
            !excluded
        })
        .collect();

    files.sort();
    files
}

/// Directories strictly under `root` that directly hold a qualifying
/// implementation file and whose own name does not mention `test`.
pub fn discover_components(root: &Path, files: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut components = BTreeSet::new();

    for file in files {
        let rel = relative_path(root, file);
        // Files directly in the root never make the root a component
        if !rel.contains('/') || file_kind(&rel) != FileKind::Implementation {
            continue;
        }
        let Some(dir) = file.parent() else {
            continue;
        };
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains("test") {
            continue;
        }
        components.insert(dir.to_path_buf());
    }

    components
}

/// Run the COLLECT phase over a project root.
///
/// A missing root or a tree with no components is fatal; unreadable files
/// are not.
pub fn collect_project(
    root: &Path,
    config: &GovernanceConfig,
    options: &CollectOptions,
) -> Result<CollectionResult, GovernanceError> {
    if !root.is_dir() {
        return Err(GovernanceError::structure(
            format!(
                "project root {} does not exist or is not a directory",
                root.display()
            ),
            0,
        ));
    }

    let files = discover_files(root, &config.exclude);
    let component_dirs = discover_components(root, &files);
    if component_dirs.is_empty() {
        return Err(GovernanceError::structure(
            format!(
                "no component directories found under {} ({} source files discovered)",
                root.display(),
                files.len()
            ),
            0,
        ));
    }
    info!(
        "Discovered {} source files in {} components",
        files.len(),
        component_dirs.len()
    );

    let collector = FileMetricsCollector::new(&config.includes);
    let calculator = CostCalculator::new(config);
    let (priced, files_failed) = measure_files(root, &files, &collector, &calculator, options);
    let files_processed = priced.len() - files_failed;

    if let Some(bad) = priced
        .iter()
        .find(|f| f.metrics.final_cost < 0.0 || !f.metrics.final_cost.is_finite())
    {
        return Err(GovernanceError::invariant(
            format!(
                "cost of {} is {} (must be a non-negative number)",
                bad.relative_path, bad.metrics.final_cost
            ),
            files_processed,
        ));
    }

    let components = aggregate_components(root, &component_dirs, &priced);

    Ok(CollectionResult {
        files: priced,
        components,
        files_processed,
        files_failed,
    })
}

/// Measure and price files in parallel. Output order matches `files`.
fn measure_files(
    root: &Path,
    files: &[PathBuf],
    collector: &FileMetricsCollector,
    calculator: &CostCalculator,
    options: &CollectOptions,
) -> (Vec<PricedFile>, usize) {
    let bar = if options.show_progress {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(bar_style());
        bar.set_message("Measuring files...");
        bar
    } else {
        ProgressBar::hidden()
    };

    let failed = AtomicUsize::new(0);
    let job = || -> Vec<PricedFile> {
        files
            .par_iter()
            .map(|path| {
                let (metrics, ok) = collector.collect_or_zero(path);
                if !ok {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
                bar.inc(1);
                calculator.price(path.clone(), relative_path(root, path), metrics)
            })
            .collect()
    };

    let priced = match rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .thread_name(|i| format!("archgate-collect-{}", i))
        .build()
    {
        Ok(pool) => pool.install(job),
        Err(e) => {
            warn!("Failed to build worker pool ({}), using the global pool", e);
            job()
        }
    };

    let failed = failed.load(Ordering::Relaxed);
    bar.finish_with_message(format!("Measured {} files", files.len()));
    (priced, failed)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Reduce file costs into component costs. Each file is added to every
/// component among its ancestors; components come out in sorted order.
fn aggregate_components(
    root: &Path,
    component_dirs: &BTreeSet<PathBuf>,
    files: &[PricedFile],
) -> Vec<ComponentCost> {
    let dirs: Vec<&Path> = component_dirs.iter().map(PathBuf::as_path).collect();
    let index: FxHashMap<&Path, usize> = dirs.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let mut members: Vec<Vec<&PricedFile>> = vec![Vec::new(); dirs.len()];

    for file in files {
        for ancestor in file.path.ancestors().skip(1) {
            if ancestor == root {
                break;
            }
            if let Some(&slot) = index.get(ancestor) {
                members[slot].push(file);
            }
        }
    }

    dirs.into_iter()
        .zip(members)
        .map(|(dir, files)| {
            let mut metrics = FileMetrics::default();
            for file in &files {
                metrics.absorb(&file.metrics);
            }
            let component = ComponentCost {
                name: relative_path(root, dir),
                path: dir.to_path_buf(),
                cost: round_to(metrics.final_cost, 4),
                file_count: files.len(),
                dominant_phase: dominant_phase(files.iter().copied()),
                metrics,
            };
            debug!(
                "Component {} cost {:.4} over {} files",
                component.name, component.cost, component.file_count
            );
            component
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn plain_lines(n: usize) -> String {
        (0..n).map(|i| format!("int v{} = {};\n", i, i)).collect()
    }

    fn names(components: &[ComponentCost]) -> Vec<&str> {
        components.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/proj");
        assert_eq!(relative_path(root, Path::new("/proj/src/core/a.c")), "src/core/a.c");
    }

    #[test]
    fn test_discovery_respects_ignores_and_exclusions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "core/engine.c", "int a;\n");
        write(root, "core/notes.txt", "not source\n");
        write(root, "vendor/zlib/inflate.c", "int z;\n");
        write(root, "generated/out.c", "int g;\n");
        write(root, ".hidden/secret.c", "int h;\n");
        write(root, "scratch/tmp.c", "int t;\n");
        write(root, ".gitignore", "generated/\n");
        write(root, IGNORE_FILE_NAME, "scratch/\n");

        let files = discover_files(root, &ExcludeConfig::default());
        let rels: Vec<String> = files.iter().map(|f| relative_path(root, f)).collect();
        assert_eq!(rels, vec!["core/engine.c"]);
    }

    #[test]
    fn test_component_discovery_rules() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "main.c", "int main;\n");
        write(root, "src/app.c", "int app;\n");
        write(root, "src/core/engine.c", "int e;\n");
        write(root, "src/core/engine_test.c", "int t;\n");
        write(root, "include/engine.h", "int h;\n");
        write(root, "testing_utils/util.c", "int u;\n");
        write(root, "unit_tests/run.c", "int r;\n");

        let files = discover_files(root, &ExcludeConfig::default());
        let components: Vec<String> = discover_components(root, &files)
            .iter()
            .map(|d| relative_path(root, d))
            .collect();
        assert_eq!(components, vec!["src", "src/core"]);
    }

    #[test]
    fn test_single_file_component_cost() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let source = format!(
            "#include \"a.h\"\n#include \"b.h\"\n{}",
            plain_lines(98)
        );
        write(root, "core/engine.c", &source);

        let config = GovernanceConfig::default();
        let result = collect_project(root, &config, &CollectOptions::default()).expect("collect");
        assert_eq!(result.components.len(), 1);

        let core = &result.components[0];
        assert_eq!(core.name, "core");
        assert_eq!(core.metrics.lines_of_code, 100);
        assert_eq!(core.metrics.dependency_count, 2);
        assert_eq!(core.cost, 0.14);
        assert!(core.cost < config.limits.autonomous);
        assert_eq!(core.dominant_phase, Phase::Implementation);
    }

    #[test]
    fn test_component_cost_covers_subtree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "src/app.c", &plain_lines(100));
        write(root, "src/core/engine.c", &plain_lines(200));
        write(root, "src/core/engine_test.c", &plain_lines(100));

        let result = collect_project(root, &GovernanceConfig::default(), &CollectOptions::default())
            .expect("collect");
        assert_eq!(names(&result.components), vec!["src", "src/core"]);

        let src = &result.components[0];
        let core = &result.components[1];
        // engine_test.c: 0.1 * 0.6 (test) * 0.7 (validation)
        assert_eq!(core.cost, 0.242);
        assert_eq!(core.file_count, 2);
        assert_eq!(src.cost, 0.342);
        assert_eq!(src.file_count, 3);
        assert_eq!(result.files_processed, 3);
        assert_eq!(result.files_failed, 0);
    }

    #[test]
    fn test_aggregation_is_independent_of_worker_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        for i in 0..12 {
            write(
                root,
                &format!("mod{}/part{}/file{}.c", i % 3, i % 4, i),
                &format!("{}if (x) {{ y(); }}\n", plain_lines(i * 7 + 1)),
            );
        }

        let config = GovernanceConfig::default();
        let serial = collect_project(
            root,
            &config,
            &CollectOptions {
                workers: 1,
                show_progress: false,
            },
        )
        .expect("serial");
        let parallel = collect_project(
            root,
            &config,
            &CollectOptions {
                workers: 6,
                show_progress: false,
            },
        )
        .expect("parallel");

        assert_eq!(serial.components, parallel.components);
        assert_eq!(serial.files, parallel.files);
    }

    #[test]
    fn test_unreadable_file_costs_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "core/engine.c", &plain_lines(100));
        let blob = root.join("core/blob.c");
        fs::write(&blob, [0xff, 0xfe, 0x80]).expect("write");

        let result = collect_project(root, &GovernanceConfig::default(), &CollectOptions::default())
            .expect("collect");
        assert_eq!(result.files_processed, 1);
        assert_eq!(result.files_failed, 1);
        assert_eq!(result.components[0].cost, 0.1);
        assert_eq!(result.components[0].file_count, 2);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = collect_project(
            &dir.path().join("nope"),
            &GovernanceConfig::default(),
            &CollectOptions::default(),
        )
        .expect_err("missing root");
        assert!(matches!(err, GovernanceError::ProjectStructure { .. }));
        assert_eq!(err.files_processed(), 0);
    }

    #[test]
    fn test_no_components_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "main.c", &plain_lines(10));
        write(root, "tests/check.c", &plain_lines(10));

        let err = collect_project(root, &GovernanceConfig::default(), &CollectOptions::default())
            .expect_err("no components");
        assert!(matches!(err, GovernanceError::ProjectStructure { .. }));
        assert!(err.to_string().contains("no component directories"));
    }
}
