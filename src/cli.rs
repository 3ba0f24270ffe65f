//! Command line front end: validate documents, check schema files.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::compile::Compiler;
use crate::config::{Assertions, CompileOptions, NumberPolicy};
use crate::outcome::ValidationResult;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON Schemas and validate JSON documents against them
#[derive(Parser, Debug)]
#[command(name = "jsch", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate one or more documents against a schema
    Validate(ValidateCmd),
    /// check schema files against the draft-04 meta-schema and compile them
    Check(CheckCmd),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct CompileSettings {
    /// JSON file with compile options (number_policy, assertions, max_depth, fetch_timeout)
    #[arg(long)]
    config: Option<PathBuf>,

    /// let integer literals satisfy `"type": "number"`
    #[arg(long, default_value_t = false)]
    lenient_numbers: bool,

    /// also enforce string and numeric range keywords
    #[arg(long, default_value_t = false)]
    full_assertions: bool,

    /// nesting limit for compilation and validation
    #[arg(long)]
    max_depth: Option<usize>,

    /// timeout for fetching remote `$ref` documents
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,
}

#[derive(clap::Parser, Debug)]
struct ValidateCmd {
    /// schema file
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    compile_settings: CompileSettings,

    /// print one JSON object per document instead of colored lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    /// schema files; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    #[command(flatten)]
    compile_settings: CompileSettings,
}

/// One `--json` output line.
#[derive(Debug, Serialize)]
struct Report<'a> {
    file: String,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CompileSettings {
    fn options(&self) -> anyhow::Result<CompileOptions> {
        let mut options = match self.config.as_ref() {
            None => CompileOptions::default(),
            Some(path) => {
                let source = std::fs::read(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                crate::path_de::from_slice_with_path::<CompileOptions>(&source)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
        };
        if self.lenient_numbers {
            options.number_policy = NumberPolicy::Lenient;
        }
        if self.full_assertions {
            options.assertions = Assertions::Full;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(ms) = self.fetch_timeout_ms {
            options.fetch_timeout = Duration::from_millis(ms);
        }
        debug!(?options, "compile options");
        Ok(options)
    }
}

impl InputSettings {
    fn load(&self, path: &Path) -> anyhow::Result<Value> {
        let document = crate::loader::load_json_from_file(path)?;
        match self.json_pointer.as_ref() {
            None => Ok(document),
            Some(pointer) => {
                let selected = crate::pointer::resolve_local(pointer, &document)
                    .with_context(|| format!("selecting {pointer} in {}", path.display()))?;
                Ok(selected.clone())
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when at least one document or schema is invalid.
    pub fn run(&self) -> anyhow::Result<bool> {
        match &self.cmd {
            Command::Validate(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl ValidateCmd {
    fn run(&self) -> anyhow::Result<bool> {
        let compiler = Compiler::new(self.compile_settings.options()?);
        let schema = crate::loader::load_schema_with(&self.schema, &compiler)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))?;
        let source_paths = resolve_file_path_patterns(&self.input_settings.input)?;
        info!(schema = %self.schema.display(), inputs = source_paths.len(), "validating");

        let results = source_paths
            .par_iter()
            .map(|path| -> anyhow::Result<(&PathBuf, ValidationResult)> {
                let document = self.input_settings.load(path)?;
                Ok((path, schema.validate(&document)))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let all_valid = results.iter().all(|(_, result)| result.valid);
        if self.json {
            for (path, result) in &results {
                let report = Report { file: path.display().to_string(), result };
                println!("{}", serde_json::to_string(&report)?);
            }
        } else {
            for (path, result) in &results {
                print_outcome(path, result.valid, &result.to_string());
            }
        }
        Ok(all_valid)
    }
}

impl CheckCmd {
    fn run(&self) -> anyhow::Result<bool> {
        let compiler = Compiler::new(self.compile_settings.options()?);
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let outcomes = source_paths
            .par_iter()
            .map(|path| (path, crate::loader::load_schema_with(path, &compiler).map(|_| ())))
            .collect::<Vec<_>>();
        let mut all_valid = true;
        for (path, outcome) in outcomes {
            match outcome {
                Ok(()) => print_outcome(path, true, "valid"),
                Err(error) => {
                    all_valid = false;
                    print_outcome(path, false, &error.to_string());
                }
            }
        }
        Ok(all_valid)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_outcome(path: &Path, valid: bool, detail: &str) {
    if valid {
        println!("{} {}", "✅".green(), path.display());
    } else {
        println!("{} {}: {}", "❌".red(), path.display(), detail.red());
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_paths_pass_through_and_globs_expand() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.json", "b.json", "c.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let pattern = format!("{}/*.json", dir.path().display());
        let mut found = resolve_file_path_patterns([pattern.as_str(), "literal.json"]).unwrap();
        found.sort();
        assert_eq!(found.len(), 3);
        assert!(found.contains(&PathBuf::from("literal.json")));
        assert!(found.iter().all(|p| p.extension().is_some_and(|e| e == "json")));

        let empty = format!("{}/*.yaml", dir.path().display());
        assert!(resolve_file_path_patterns([empty.as_str()]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("options.json");
        std::fs::write(&config, json!({"assertions": "full", "max_depth": 12}).to_string()).unwrap();
        let settings = CompileSettings {
            config: Some(config),
            lenient_numbers: true,
            full_assertions: false,
            max_depth: Some(40),
            fetch_timeout_ms: None,
        };
        let options = settings.options().unwrap();
        assert_eq!(options.number_policy, NumberPolicy::Lenient);
        assert_eq!(options.assertions, Assertions::Full);
        assert_eq!(options.max_depth, 40);
    }

    #[test]
    fn validate_reports_invalid_documents() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        std::fs::write(&schema, json!({"type": "object", "required": ["id"]}).to_string()).unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, json!({"wrapper": {"id": 1}}).to_string()).unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, json!({"wrapper": {}}).to_string()).unwrap();

        let cli = CommandLineInterface::parse_from([
            "jsch".to_string(),
            "validate".to_string(),
            "--schema".to_string(),
            schema.display().to_string(),
            "--json-pointer".to_string(),
            "/wrapper".to_string(),
            "--input".to_string(),
            good.display().to_string(),
        ]);
        assert!(cli.run().unwrap());

        let cli = CommandLineInterface::parse_from([
            "jsch".to_string(),
            "validate".to_string(),
            "--schema".to_string(),
            schema.display().to_string(),
            "--json-pointer".to_string(),
            "/wrapper".to_string(),
            "--json".to_string(),
            "--input".to_string(),
            good.display().to_string(),
            bad.display().to_string(),
        ]);
        assert!(!cli.run().unwrap());
    }

    #[test]
    fn check_flags_meta_invalid_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, json!({"type": "string"}).to_string()).unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, json!({"type": 5}).to_string()).unwrap();
        let cli = CommandLineInterface::parse_from([
            "jsch".to_string(),
            "check".to_string(),
            "--input".to_string(),
            good.display().to_string(),
        ]);
        assert!(cli.run().unwrap());
        let cli = CommandLineInterface::parse_from([
            "jsch".to_string(),
            "check".to_string(),
            "--input".to_string(),
            good.display().to_string(),
            bad.display().to_string(),
        ]);
        assert!(!cli.run().unwrap());
    }
}
