//! Privilege-dropping helper for the embedded PostgreSQL test cluster.
//!
//! `pg_embedded_setup_unpriv` runs this binary when the database-backed
//! integration suites execute as root. Usage:
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! The payload is a serialised [`WorkerPayload`]. When it carries
//! environment changes, the worker re-runs itself with them applied, so the
//! process that drives PostgreSQL starts with the right environment.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use color_eyre::eyre::{Context, Report, Result, eyre};
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

/// Set on the re-run so the payload environment is applied only once.
const ENVIRONMENT_APPLIED: &str = "CAFEHUB_PG_WORKER_ENV_APPLIED";

fn main() -> Result<()> {
    color_eyre::install()?;
    let invocation = Invocation::parse(env::args_os().skip(1))?;
    invocation.run()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Setup,
    Start,
    Stop,
}

impl TryFrom<&str> for Lifecycle {
    type Error = Report;

    fn try_from(raw: &str) -> Result<Self> {
        match raw {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(eyre!(
                "unknown lifecycle step '{other}'; expected setup, start or stop"
            )),
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

#[derive(Debug)]
struct Invocation {
    step: Lifecycle,
    payload_path: PathBuf,
}

impl Invocation {
    fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Self> {
        let step = args.next().ok_or_else(|| eyre!("missing lifecycle step"))?;
        let step = Lifecycle::try_from(step.to_string_lossy().as_ref())?;
        let payload_path = args
            .next()
            .map(PathBuf::from)
            .ok_or_else(|| eyre!("missing payload path"))?;
        if let Some(extra) = args.next() {
            return Err(eyre!(
                "unexpected argument '{}' after payload path",
                extra.to_string_lossy()
            ));
        }
        Ok(Self { step, payload_path })
    }

    fn run(self) -> Result<()> {
        let payload = read_payload(&self.payload_path)?;
        if !payload.environment.is_empty() && env::var_os(ENVIRONMENT_APPLIED).is_none() {
            return self.rerun_with(&payload.environment);
        }
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| Report::new(err).wrap_err("rebuild postgres settings"))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("build worker runtime")?;
        let mut postgres = PostgreSQL::new(settings);
        let step = self.step;
        runtime
            .block_on(async move {
                match step {
                    Lifecycle::Setup => postgres.setup().await,
                    Lifecycle::Start => postgres.start().await,
                    Lifecycle::Stop => postgres.stop().await,
                }
            })
            .with_context(|| format!("postgres {step} failed"))
    }

    fn rerun_with(&self, environment: &[(String, Option<PlainSecret>)]) -> Result<()> {
        let mut command = Command::new(env::current_exe().wrap_err("locate worker binary")?);
        command
            .arg(self.step.to_string())
            .arg(&self.payload_path)
            .env(ENVIRONMENT_APPLIED, "1");
        for (key, value) in environment {
            match value {
                Some(value) => command.env(key, value.expose()),
                None => command.env_remove(key),
            };
        }
        let status = command.status().wrap_err("re-run worker")?;
        if status.success() {
            Ok(())
        } else {
            Err(eyre!("worker {} exited with {status}", self.step))
        }
    }
}

fn read_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = fs::read(path).with_context(|| format!("read payload {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse payload {}", path.display()))
}
