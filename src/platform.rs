//! Host platform detection and per-platform artifact naming.

use std::fmt;

/// Operating system the release artifacts were built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    /// Any other system, carried by name so errors can report it.
    Other(String),
}

impl Platform {
    /// Map a system name as reported by `uname -s` style APIs
    /// (`Darwin`, `Linux`, `Windows`) to a platform.
    pub fn from_system_name(name: &str) -> Self {
        match name {
            "Darwin" => Platform::MacOs,
            "Linux" => Platform::Linux,
            "Windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Map a target triple (e.g. `x86_64-pc-windows-msvc`) to a platform.
    pub fn from_target(target: &str) -> Self {
        let segments: Vec<&str> = target.split('-').collect();
        if segments.contains(&"darwin") {
            Platform::MacOs
        } else if segments.contains(&"linux") {
            Platform::Linux
        } else if segments.contains(&"windows") {
            Platform::Windows
        } else {
            let os = segments.get(2).copied().unwrap_or(target);
            Platform::Other(os.to_string())
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        Self::from_target(build_target())
    }

    /// System name: `Darwin`, `Linux`, `Windows` or the raw name.
    pub fn system_name(&self) -> &str {
        match self {
            Platform::MacOs => "Darwin",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Other(name) => name.as_str(),
        }
    }

    /// Label inserted into packaged asset names. Only macOS differs from the
    /// system name.
    pub fn label(&self) -> &str {
        match self {
            Platform::MacOs => "macOS",
            other => other.system_name(),
        }
    }

    /// Glob pattern for the app installer, relative to the working directory.
    pub fn artifact_pattern(&self) -> Option<&'static str> {
        match self {
            Platform::MacOs => Some("dist/mac/LBRY*.dmg"),
            Platform::Linux => Some("dist/LBRY*.deb"),
            Platform::Windows => Some("dist/LBRY*.exe"),
            Platform::Other(_) => None,
        }
    }

    /// File extension appended to executables.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.system_name())
    }
}

/// Returns the compile-time target triple (e.g. "aarch64-apple-darwin").
pub fn build_target() -> &'static str {
    env!("TARGET")
}
