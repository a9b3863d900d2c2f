//! Embedded PostgreSQL bootstrap for the database-backed suites.
//!
//! `pg-embed-setup-unpriv` installs binaries and data under `/var/tmp` by
//! default. When `PG_RUNTIME_DIR` or `PG_DATA_DIR` is unset, both are pointed
//! at a fresh directory under the cargo target directory for the duration of
//! the bootstrap. When `PG_EMBEDDED_WORKER` is unset, it is pointed at this
//! crate's `pg_worker` binary so root runs can drop privileges.
//!
//! Environment changes are serialised through `env_lock` and a bootstrap
//! mutex, so parallel tests never observe a half-applied override.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pg_embedded_setup_unpriv::TestCluster;
use uuid::Uuid;

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const BOOTSTRAP_ATTEMPTS: u32 = 4;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Download and network failures worth another attempt.
const TRANSIENT_MARKERS: [&str; 7] = [
    "error decoding response body",
    "connection reset",
    "connection refused",
    "timed out",
    "timeout",
    "temporarily unavailable",
    "dns error",
];

fn scratch_dirs() -> std::io::Result<(PathBuf, PathBuf)> {
    let target = std::env::var_os("CARGO_TARGET_DIR").map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"),
        PathBuf::from,
    );
    let base = target
        .join("pg-embed")
        .join(format!("cafehub-{}-{}", std::process::id(), Uuid::new_v4()));
    let runtime_dir = base.join("install");
    let data_dir = base.join("data");
    std::fs::create_dir_all(&runtime_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok((runtime_dir, data_dir))
}

fn is_transient(error: &str) -> bool {
    let error = error.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| error.contains(marker))
}

fn env_overrides() -> Result<Vec<(&'static str, Option<String>)>, String> {
    let mut overrides = Vec::new();
    if std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none() {
        let (runtime_dir, data_dir) = scratch_dirs().map_err(|err| err.to_string())?;
        overrides.push((
            "PG_RUNTIME_DIR",
            Some(runtime_dir.to_string_lossy().into_owned()),
        ));
        overrides.push(("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())));
    }
    if std::env::var_os("PG_EMBEDDED_WORKER").is_none() {
        overrides.push((
            "PG_EMBEDDED_WORKER",
            Some(env!("CARGO_BIN_EXE_pg_worker").to_owned()),
        ));
    }
    Ok(overrides)
}

/// Start a [`TestCluster`], retrying transient download failures with
/// exponential backoff.
pub fn test_cluster() -> Result<TestCluster, String> {
    let _bootstrap = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    let _env = env_lock::lock_env(env_overrides()?);

    let mut last_error = String::new();
    for attempt in 0..BOOTSTRAP_ATTEMPTS {
        match TestCluster::new() {
            Ok(cluster) => return Ok(cluster),
            Err(err) => last_error = format!("{err:?}"),
        }
        if attempt + 1 == BOOTSTRAP_ATTEMPTS || !is_transient(&last_error) {
            break;
        }
        std::thread::sleep(BACKOFF_BASE * 2_u32.pow(attempt));
    }
    Err(last_error)
}
