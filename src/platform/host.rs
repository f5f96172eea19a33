// CrashWatch - platform/host.rs
//
// Machine and operating-system description written into event-log records.

/// Host description captured once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub host: String,
    pub os: String,
}

impl HostInfo {
    /// Detect the machine name and OS.
    ///
    /// The machine name comes from `COMPUTERNAME` (Windows), `HOSTNAME`, or
    /// `/etc/hostname`, in that order; `unknown` if none is available.
    pub fn detect() -> Self {
        let host = ["COMPUTERNAME", "HOSTNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .or_else(read_etc_hostname)
            .unwrap_or_else(|| "unknown".to_string());

        let os = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);
        tracing::debug!(host = %host, os = %os, "Host info detected");
        Self { host, os }
    }

    /// Fixed values for tests and embedding.
    pub fn fixed(host: &str, os: &str) -> Self {
        Self {
            host: host.to_string(),
            os: os.to_string(),
        }
    }
}

#[cfg(unix)]
fn read_etc_hostname() -> Option<String> {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(not(unix))]
fn read_etc_hostname() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_never_returns_empty_fields() {
        let info = HostInfo::detect();
        assert!(!info.host.is_empty());
        assert!(info.os.contains(std::env::consts::OS));
    }
}
