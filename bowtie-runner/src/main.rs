//! Line-delimited JSON harness speaking the bowtie test-runner protocol.
//!
//! One request per stdin line, one response per stdout line. Logs go to stderr.
use std::io::{BufRead, Write};

use anyhow::{Context, ensure};
use clap::Parser;
use jsch::{Assertions, CompileOptions, Compiler, MapRetriever, NumberPolicy};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DIALECTS: [&str; 5] = [
    "http://json-schema.org/draft-07/schema#",
    "http://json-schema.org/draft-06/schema#",
    "http://json-schema.org/draft-04/schema#",
    "http://json-schema.org/draft-03/schema#",
    "https://json-schema.org/draft/2020-12/schema",
];

/// bowtie runner for the jsch validator
#[derive(Parser, Debug)]
struct Settings {
    /// let integer literals satisfy `"type": "number"`
    #[arg(long, default_value_t = false)]
    lenient_numbers: bool,

    /// also enforce string and numeric range keywords
    #[arg(long, default_value_t = false)]
    full_assertions: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
enum Request {
    Start { version: u32 },
    Dialect { dialect: String },
    Run { seq: Value, case: TestCase },
    Stop,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    schema: Value,
    tests: Vec<Test>,
    /// Documents reachable through `$ref`, keyed by URI.
    #[serde(default)]
    registry: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Test {
    instance: Value,
}

struct Runner {
    started: bool,
    options: CompileOptions,
}

impl Runner {
    fn new(options: CompileOptions) -> Self { Self { started: false, options } }

    /// `None` once the harness asks us to stop.
    fn handle(&mut self, request: Request) -> anyhow::Result<Option<Value>> {
        let response = match request {
            Request::Start { version } => {
                ensure!(version == 1, "unsupported protocol version {version}");
                self.started = true;
                json!({
                    "ready": true,
                    "version": 1,
                    "implementation": {
                        "language": "rust",
                        "name": "jsch",
                        "version": env!("CARGO_PKG_VERSION"),
                        "homepage": "https://jreutter.sitios.ing.uc.cl/JSch/",
                        "issues": "unknown",
                        "dialects": DIALECTS,
                    },
                })
            }
            Request::Dialect { dialect } => {
                ensure!(self.started, "not started");
                debug!(dialect, "dialect selection ignored");
                json!({"ok": false})
            }
            Request::Run { seq, case } => {
                ensure!(self.started, "not started");
                self.run_case(seq, case)
            }
            Request::Stop => {
                ensure!(self.started, "not started");
                return Ok(None);
            }
        };
        Ok(Some(response))
    }

    fn run_case(&self, seq: Value, case: TestCase) -> Value {
        let retriever = case
            .registry
            .unwrap_or_default()
            .into_iter()
            .collect::<MapRetriever>();
        let compiler = Compiler::new(self.options.clone()).with_retriever(retriever);
        let schema = match compiler.compile(&case.schema) {
            Ok(schema) => schema,
            Err(error) => {
                warn!(%error, "schema did not compile");
                return json!({"seq": seq, "errored": true, "context": {"message": error.to_string()}});
            }
        };
        let results = case
            .tests
            .iter()
            .map(|test| json!({"valid": schema.is_valid(&test.instance)}))
            .collect::<Vec<_>>();
        json!({"seq": seq, "results": results})
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let settings = Settings::parse();
    let mut options = CompileOptions::default();
    if settings.lenient_numbers {
        options.number_policy = NumberPolicy::Lenient;
    }
    if settings.full_assertions {
        options.assertions = Assertions::Full;
    }
    let mut runner = Runner::new(options);

    let mut stdout = std::io::stdout().lock();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = jsch::path_de::from_str_with_path(&line).context("malformed request")?;
        match runner.handle(request)? {
            Some(response) => {
                writeln!(stdout, "{response}")?;
                stdout.flush()?;
            }
            None => break,
        }
    }
    Ok(())
}
