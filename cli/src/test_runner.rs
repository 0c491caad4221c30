use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use driver::{Fields, Warning};
use rep::Template;

const TEST_SUFFIX: &str = ".test.html";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must be about this block (dotted path, `root` at the top).
    #[serde(default)]
    pub block: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Variable values and block repetitions to render with.
    #[serde(default)]
    pub data: Fields,

    /// Expected exact output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected parse failure: the error message must contain this substring.
    #[serde(default)]
    pub expect_parse_error: Option<String>,

    /// Expected render failure: the error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.html` file into its TOML config and the template source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let Some(after_open) = content.strip_prefix("---") else {
        return Err("missing opening --- frontmatter delimiter".into());
    };
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

#[derive(Debug)]
pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Ok(content) => match parse_test_file(&content) {
            Ok((config, source)) => (config.description.clone(), check_test(&config, source)),
            Err(e) => (None, Err(format!("frontmatter error: {}", e))),
        },
        Err(e) => (None, Err(format!("cannot read file: {}", e))),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: match outcome {
            Ok(()) => TestOutcome::Pass,
            Err(reason) => TestOutcome::Fail(reason),
        },
    }
}

/// Parse and render one test template, comparing against its expectations.
fn check_test(config: &TestConfig, source: &str) -> Result<(), String> {
    tracing::debug!(description = ?config.description, "running test");
    let parse_result = Template::<Vec<u8>>::parse(source);

    let mut template = match (&config.expect_parse_error, parse_result) {
        (Some(expected), Err(err)) => {
            let msg = err.to_string();
            return if msg.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "expected parse error containing \"{}\", got: {}",
                    expected, msg
                ))
            };
        }
        (Some(_), Ok(_)) => {
            return Err("expected parse error, but parsing succeeded".into());
        }
        (None, Err(err)) => return Err(format!("unexpected parse error: {}", err)),
        (None, Ok(template)) => template,
    };

    let render_result = driver::render(&mut template, &config.data, Vec::new());

    let warnings = match (&config.expect_error, render_result) {
        (Some(expected), Err(err)) => {
            let msg = err.to_string();
            return if msg.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!("expected error containing \"{}\", got: {}", expected, msg))
            };
        }
        (Some(expected), Ok(_)) => {
            return Err(format!(
                "expected error containing \"{}\", but rendering succeeded",
                expected
            ));
        }
        (None, Err(err)) => return Err(format!("unexpected render error: {}", err)),
        (None, Ok(warnings)) => warnings,
    };

    if let Some(expected_output) = &config.expect_output {
        let output = template.into_sink().unwrap_or_default();
        let actual = String::from_utf8_lossy(&output);
        let actual = actual.trim();
        let expected = expected_output.trim();
        if actual != expected {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected, actual
            ));
        }
    }

    if let Some(expected_warnings) = &config.expect_warnings {
        check_warnings(&warnings, expected_warnings)?;
    }
    Ok(())
}

/// Check that actual warnings match expectations, in order.
fn check_warnings(actual: &[Warning], expected: &[ExpectedWarning]) -> Result<(), String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|w| format!("  - {}", w)).collect();
        return Err(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(&expected.contains) {
            return Err(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }
        if let Some(block) = &expected.block {
            if *block != actual.block {
                return Err(format!(
                    "warning[{}]: expected for block {}, but it is for {}",
                    i, block, actual.block
                ));
            }
        }
    }
    Ok(())
}

/// Discover test files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run all test files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        select_categories(all_categories, categories)
    };

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(cat), "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Keep the requested categories and their subcategories.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all;
    }

    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let prefix = format!("{}/", req);
        let matching: Vec<&String> = all
            .keys()
            .filter(|cat| cat.as_str() == req || cat.starts_with(&prefix))
            .collect();
        if matching.is_empty() {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for cat in matching {
            selected.insert(cat.clone(), all[cat].clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cases")
    }

    #[test]
    fn frontmatter_is_split_from_the_template() {
        let content = "---\ndescription = \"x\"\n[data]\nname = \"Ada\"\n---\n<p>NAME</p>\n";
        let (config, source) = parse_test_file(content).unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(config.data.len(), 1);
        assert_eq!(source, "<p>NAME</p>\n");

        assert!(parse_test_file("<p>no frontmatter</p>").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn categories_are_filtered_by_prefix() {
        let all = discover_categorized(&cases_dir());
        assert!(all.contains_key("render"));
        assert!(all.contains_key("errors"));

        let only = select_categories(all, &["errors".to_string()]);
        assert!(only.keys().all(|k| k == "errors" || k.starts_with("errors/")));
    }

    #[test]
    fn fixture_cases_pass() {
        let categories = discover_categorized(&cases_dir());
        let files: Vec<&PathBuf> = categories.values().flatten().collect();
        assert!(!files.is_empty(), "no fixture cases found");

        let failures: Vec<String> = files
            .into_iter()
            .map(|file| run_single_test(file))
            .filter_map(|result| match result.outcome {
                TestOutcome::Pass => None,
                TestOutcome::Fail(reason) => {
                    Some(format!("{}: {}", result.path.display(), reason))
                }
            })
            .collect();
        assert!(failures.is_empty(), "failing cases:\n{}", failures.join("\n"));
    }

    #[test]
    fn mismatched_output_fails() {
        let config: TestConfig = toml::from_str("expect_output = \"b\"").unwrap();
        let err = check_test(&config, "a").unwrap_err();
        assert!(err.starts_with("output mismatch"));
    }
}
