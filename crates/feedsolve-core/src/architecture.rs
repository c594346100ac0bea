//! Operating system and CPU pairs, written as `os-cpu` (e.g. `Linux-x86_64`).

use std::fmt;
use std::str::FromStr;

use feedsolve_util::errors::SolveError;
use serde::{Deserialize, Serialize};

/// Operating system an implementation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Os {
    #[default]
    All,
    Linux,
    Solaris,
    FreeBsd,
    MacOsX,
    Darwin,
    Cygwin,
    Posix,
    Windows,
    Unknown,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Linux => "Linux",
            Self::Solaris => "Solaris",
            Self::FreeBsd => "FreeBSD",
            Self::MacOsX => "MacOSX",
            Self::Darwin => "Darwin",
            Self::Cygwin => "Cygwin",
            Self::Posix => "POSIX",
            Self::Windows => "Windows",
            Self::Unknown => "unknown",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "*" => Self::All,
            "Linux" => Self::Linux,
            "Solaris" => Self::Solaris,
            "FreeBSD" => Self::FreeBsd,
            "MacOSX" => Self::MacOsX,
            "Darwin" => Self::Darwin,
            "Cygwin" => Self::Cygwin,
            "POSIX" => Self::Posix,
            "Windows" => Self::Windows,
            _ => return None,
        })
    }

    fn is_unix(&self) -> bool {
        matches!(
            self,
            Self::Linux
                | Self::Solaris
                | Self::FreeBsd
                | Self::MacOsX
                | Self::Darwin
                | Self::Cygwin
                | Self::Posix
        )
    }

    /// Whether an implementation built for `self` runs on `system`.
    pub fn runs_on(self, system: Os) -> bool {
        if self == Self::All || system == Self::All {
            return true;
        }
        if self == Self::Unknown || system == Self::Unknown {
            return false;
        }
        self == system
            || (self == Self::Windows && system == Self::Cygwin)
            || (self == Self::Darwin && system == Self::MacOsX)
            || (self == Self::Posix && system.is_unix())
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU family an implementation targets. `Source` marks source code that
/// must be compiled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Cpu {
    #[default]
    All,
    I386,
    I486,
    I586,
    I686,
    X86_64,
    Ppc,
    Ppc64,
    Armv6l,
    Armv7l,
    Aarch64,
    Source,
    Unknown,
}

impl Cpu {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::I386 => "i386",
            Self::I486 => "i486",
            Self::I586 => "i586",
            Self::I686 => "i686",
            Self::X86_64 => "x86_64",
            Self::Ppc => "ppc",
            Self::Ppc64 => "ppc64",
            Self::Armv6l => "armv6l",
            Self::Armv7l => "armv7l",
            Self::Aarch64 => "aarch64",
            Self::Source => "src",
            Self::Unknown => "unknown",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "*" => Self::All,
            "i386" => Self::I386,
            "i486" => Self::I486,
            "i586" => Self::I586,
            "i686" => Self::I686,
            "x86_64" => Self::X86_64,
            "ppc" => Self::Ppc,
            "ppc64" => Self::Ppc64,
            "armv6l" => Self::Armv6l,
            "armv7l" => Self::Armv7l,
            "aarch64" => Self::Aarch64,
            "src" => Self::Source,
            _ => return None,
        })
    }

    fn is_x86(&self) -> bool {
        (Self::I386..=Self::X86_64).contains(self)
    }

    /// Whether an implementation built for `self` runs on `system`.
    pub fn runs_on(self, system: Cpu) -> bool {
        if self == Self::All || system == Self::All {
            return true;
        }
        if self == Self::Unknown || system == Self::Unknown {
            return false;
        }
        self == system
            || (self == Self::Ppc && system == Self::Ppc64)
            || (self == Self::Armv6l && system == Self::Armv7l)
            || (self.is_x86() && system.is_x86() && system >= self)
    }

    /// Higher means a narrower target. `*` is the least specific.
    pub fn specificity(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OS and CPU pair. Either half may be a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Architecture {
    pub os: Os,
    pub cpu: Cpu,
}

impl Architecture {
    /// `*-*`: runs anywhere.
    pub const ALL: Self = Self {
        os: Os::All,
        cpu: Cpu::All,
    };

    pub fn new(os: Os, cpu: Cpu) -> Self {
        Self { os, cpu }
    }

    /// Parse `os-cpu`. Names this crate doesn't know map to `unknown-unknown`
    /// so that feeds for exotic platforms load but never match.
    pub fn parse(value: &str) -> Result<Self, SolveError> {
        let (os, cpu) = value.split_once('-').ok_or_else(|| SolveError::Parse {
            message: format!("architecture '{value}' must have the form os-cpu"),
        })?;
        if os.is_empty() || cpu.is_empty() || cpu.contains('-') {
            return Err(SolveError::Parse {
                message: format!("architecture '{value}' must have the form os-cpu"),
            });
        }
        match (Os::from_name(os), Cpu::from_name(cpu)) {
            (Some(os), Some(cpu)) => Ok(Self { os, cpu }),
            _ => {
                tracing::debug!("unrecognised architecture '{value}', treating as unknown");
                Ok(Self::new(Os::Unknown, Cpu::Unknown))
            }
        }
    }

    /// The architecture of the running host.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "linux" | "android" => Os::Linux,
            "macos" => Os::MacOsX,
            "windows" => Os::Windows,
            "freebsd" => Os::FreeBsd,
            "solaris" | "illumos" => Os::Solaris,
            _ => Os::Unknown,
        };
        let cpu = match std::env::consts::ARCH {
            "x86_64" => Cpu::X86_64,
            "x86" => Cpu::I686,
            "powerpc" => Cpu::Ppc,
            "powerpc64" => Cpu::Ppc64,
            "arm" => Cpu::Armv7l,
            "aarch64" => Cpu::Aarch64,
            _ => Cpu::Unknown,
        };
        Self { os, cpu }
    }

    /// Whether an implementation for `self` can run on `system`.
    pub fn is_compatible(&self, system: &Architecture) -> bool {
        self.os.runs_on(system.os) && self.cpu.runs_on(system.cpu)
    }

    /// Replace wildcard halves with the matching half of `host`.
    pub fn resolve_wildcards(&self, host: &Architecture) -> Self {
        Self {
            os: if self.os == Os::All { host.os } else { self.os },
            cpu: if self.cpu == Cpu::All { host.cpu } else { self.cpu },
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.cpu)
    }
}

impl FromStr for Architecture {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Architecture {
    type Error = SolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Architecture> for String {
    fn from(value: Architecture) -> Self {
        value.to_string()
    }
}
