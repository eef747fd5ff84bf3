//! Privilege-dropped helper for the embedded PostgreSQL test cluster.
//!
//! When the Diesel suites run as root, `pg-embed-setup-unpriv` cannot start
//! PostgreSQL in-process. It re-executes this binary (named by
//! `PG_EMBEDDED_WORKER`) as an unprivileged user instead:
//!
//! ```text
//! pg-worker <setup|start|stop> <payload.json>
//! ```
//!
//! The payload is the library's own `WorkerPayload` JSON.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::{Context, Report, Result, bail, eyre};
use pg_embedded_setup_unpriv::worker::WorkerPayload;
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Setup,
    Start,
    Stop,
}

impl Step {
    fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    step: Step,
    payload: PathBuf,
}

fn parse_invocation(args: impl IntoIterator<Item = OsString>) -> Result<Invocation> {
    let mut args = args.into_iter().skip(1);
    let raw_step = args
        .next()
        .ok_or_else(|| eyre!("usage: pg-worker <setup|start|stop> <payload>"))?;
    let step = match raw_step.to_string_lossy().as_ref() {
        "setup" => Step::Setup,
        "start" => Step::Start,
        "stop" => Step::Stop,
        other => bail!("unknown step '{other}'; expected setup, start or stop"),
    };
    let payload = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| eyre!("missing payload path for '{}'", step.name()))?;
    if let Some(extra) = args.next() {
        bail!("unexpected argument '{}'", extra.to_string_lossy());
    }
    Ok(Invocation { step, payload })
}

fn run(invocation: Invocation) -> Result<()> {
    let bytes = fs::read(&invocation.payload)
        .wrap_err_with(|| format!("read {}", invocation.payload.display()))?;
    let payload: WorkerPayload = serde_json::from_slice(&bytes)
        .wrap_err_with(|| format!("parse {}", invocation.payload.display()))?;
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| Report::new(err).wrap_err("rebuild postgres settings"))?;

    for (key, value) in payload.environment {
        // SAFETY: the worker is single-threaded until the runtime below is built.
        unsafe {
            match value {
                Some(value) => env::set_var(&key, value.expose()),
                None => env::remove_var(&key),
            }
        }
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("build worker runtime")?;
    let mut postgres = PostgreSQL::new(settings);
    runtime
        .block_on(async {
            match invocation.step {
                Step::Setup => postgres.setup().await,
                Step::Start => postgres.start().await,
                Step::Stop => postgres.stop().await,
            }
        })
        .wrap_err_with(|| format!("postgres {} failed", invocation.step.name()))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    run(parse_invocation(env::args_os())?)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn args(raw: &[&str]) -> Vec<OsString> {
        std::iter::once("pg-worker")
            .chain(raw.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[rstest]
    #[case("setup", Step::Setup)]
    #[case("start", Step::Start)]
    #[case("stop", Step::Stop)]
    fn parses_each_step(#[case] raw: &str, #[case] step: Step) {
        let invocation = parse_invocation(args(&[raw, "/tmp/payload.json"])).expect("valid");
        assert_eq!(
            invocation,
            Invocation {
                step,
                payload: PathBuf::from("/tmp/payload.json"),
            }
        );
    }

    #[rstest]
    #[case(&["restart", "/tmp/payload.json"], "unknown step")]
    #[case(&["start"], "missing payload path")]
    #[case(&["stop", "/tmp/payload.json", "now"], "unexpected argument")]
    #[case(&[], "usage")]
    fn rejects_malformed_invocations(#[case] raw: &[&str], #[case] expected: &str) {
        let err = parse_invocation(args(raw)).expect_err("malformed");
        assert!(err.to_string().contains(expected), "{err}");
    }
}
