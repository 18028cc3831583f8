//! Runtime configuration: worker throttling and module path discovery.

use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::fs::FileSystem;

/// Environment variable holding the CPU limit percentage (1-100).
pub const CPU_LIMIT_ENV: &str = "GOINDEX_CPU_LIMIT";

/// Worker count and pacing for the scan pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Effective CPU limit, 1-100.
    pub cpu_limit_percent: u32,
    /// Upper bound on concurrent package loads.
    pub max_workers: usize,
    /// Sleep inserted before each package load.
    pub worker_delay: Duration,
}

impl ThrottleConfig {
    /// No throttling: one worker per available CPU, no delay.
    pub fn unthrottled() -> Self {
        Self::for_percent(100, available_cpus())
    }

    /// Read the limit from `GOINDEX_CPU_LIMIT`.
    pub fn from_env() -> Self {
        let value = std::env::var(CPU_LIMIT_ENV).ok();
        Self::from_value(value.as_deref(), available_cpus())
    }

    /// Build from a raw setting. Anything that is not an integer in
    /// 1..=100 means no throttling.
    pub fn from_value(value: Option<&str>, cpus: usize) -> Self {
        let percent = value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|p| (1..=100).contains(p))
            .unwrap_or(100) as u32;
        Self::for_percent(percent, cpus)
    }

    /// Build for a validated percentage.
    pub fn for_percent(percent: u32, cpus: usize) -> Self {
        let percent = if (1..=100).contains(&percent) { percent } else { 100 };
        let cpus = cpus.max(1);

        if percent == 100 {
            return Self {
                cpu_limit_percent: 100,
                max_workers: cpus,
                worker_delay: Duration::ZERO,
            };
        }

        Self {
            cpu_limit_percent: percent,
            max_workers: (cpus * percent as usize / 100).max(1),
            worker_delay: Duration::from_millis(u64::from(100 - percent) * 2),
        }
    }

    /// Extra pause after each package. Only heavy throttling (below 50%)
    /// backs off a second time.
    pub fn post_work_delay(&self) -> Duration {
        if self.cpu_limit_percent < 50 {
            self.worker_delay / 2
        } else {
            Duration::ZERO
        }
    }

    /// Pool size for a given amount of work.
    pub fn pool_size(&self, total: usize) -> usize {
        self.max_workers.min(total).max(1)
    }

    /// Whether any throttling is in effect.
    pub fn is_throttled(&self) -> bool {
        self.cpu_limit_percent < 100
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::unthrottled()
    }
}

/// Number of CPUs available to this process.
pub fn available_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Read the `module` directive from `<root>/go.mod`.
///
/// Returns `None` when the file is missing or has no module line.
pub fn module_path_from_go_mod(fs: &dyn FileSystem, root: &Path) -> Option<String> {
    let contents = fs.read(&root.join("go.mod")).ok()?;
    parse_module_directive(&String::from_utf8_lossy(&contents))
}

fn parse_module_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches('"');
        if module.is_empty() {
            None
        } else {
            Some(module.to_string())
        }
    })
}
