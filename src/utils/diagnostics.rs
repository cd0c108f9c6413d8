//! System Diagnostics
//!
//! Startup report of the things that usually explain a non-working setup:
//! kernel, distribution, uinput availability and the desktop session.

use std::path::Path;
use std::time::{Duration, Instant};
use sysinfo::System;
use tracing::info;

/// System information for diagnostics
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Distribution name and version (e.g. "Linux 24.06 postmarketOS")
    pub os_name: String,

    /// Kernel version string
    pub kernel_version: String,

    /// Total system memory in megabytes
    pub total_memory_mb: u64,

    /// System hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Gather system information
    pub fn gather() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        Self {
            os_name: System::long_os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            total_memory_mb: sys.total_memory() / 1024 / 1024,
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// Log system information
    pub fn log(&self) {
        info!("=== System Information ===");
        info!("  OS: {}", self.os_name);
        info!("  Kernel: {}", self.kernel_version);
        info!("  Hostname: {}", self.hostname);
        info!("  Memory: {} MB", self.total_memory_mb);
    }
}

/// Uptime tracking for the shutdown report
#[derive(Debug, Clone)]
pub struct RuntimeStats {
    /// Start time
    pub start_time: Instant,
}

impl RuntimeStats {
    /// Start counting now
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Format uptime as string
    pub fn uptime_string(&self) -> String {
        let secs = self.uptime().as_secs();
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Desktop session, from the environment
pub fn detect_desktop() -> Option<String> {
    std::env::var("XDG_CURRENT_DESKTOP")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Whether the uinput node exists
pub fn uinput_available() -> bool {
    Path::new("/dev/uinput").exists()
}

/// Log complete diagnostics on startup
pub fn log_startup_diagnostics() {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║          Startup Diagnostics                               ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    SystemInfo::gather().log();

    info!("=== Environment ===");
    match detect_desktop() {
        Some(desktop) => info!("  Desktop: {}", desktop),
        None => info!("  Desktop: Unknown"),
    }
    info!(
        "  uinput: {}",
        if uinput_available() { "present" } else { "missing (modprobe uinput)" }
    );

    info!("=== Build ===");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    #[cfg(debug_assertions)]
    info!("  Build: debug");
    #[cfg(not(debug_assertions))]
    info!("  Build: release");
}
