use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Quota dimension tracked for an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Cpu,
    Mem,
    Disk,
    DiskCount,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 4] = [Self::Cpu, Self::Mem, Self::Disk, Self::DiskCount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Mem => "mem",
            Self::Disk => "disk",
            Self::DiskCount => "disk_count",
        }
    }

    /// Unit tag attached to a rendered chart
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cpu => "CPUs",
            Self::Mem => "memory",
            Self::Disk => "storage",
            Self::DiskCount => "volumes",
        }
    }

    /// Whether usage comes from instances (as opposed to volumes)
    pub fn is_instance_backed(&self) -> bool {
        matches!(self, Self::Cpu | Self::Mem)
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "mem" => Ok(Self::Mem),
            "disk" => Ok(Self::Disk),
            "disk_count" => Ok(Self::DiskCount),
            other => Err(format!("unknown quota kind: {}", other)),
        }
    }
}

/// Quota block of an identity as served by the cloud API.
///
/// `mem` is expressed in GB on the wire; every other field is already in
/// the unit the chart displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub mem: f64,
    #[serde(default)]
    pub disk: f64,
    #[serde(default)]
    pub disk_count: f64,
}

impl Quota {
    /// Chart total for a kind (memory normalised to MB)
    pub fn total_for(&self, kind: QuotaKind) -> f64 {
        match kind {
            QuotaKind::Cpu => self.cpu,
            QuotaKind::Mem => self.mem * 1024.0,
            QuotaKind::Disk => self.disk,
            QuotaKind::DiskCount => self.disk_count,
        }
    }
}

/// Severity bucket driving the bar colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Ok,
    Warn,
    Over,
}

impl ColorTier {
    pub fn from_percent(percent: u32) -> Self {
        if percent < 50 {
            Self::Ok
        } else if percent <= 100 {
            Self::Warn
        } else {
            Self::Over
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Ok => "greenGraphBar",
            Self::Warn => "orangeGraphBar",
            Self::Over => "redGraphBar",
        }
    }
}

/// Committed usage of one quota dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotaState {
    pub kind: QuotaKind,
    pub used: f64,
    pub total: f64,
}

impl QuotaState {
    /// Returns `None` when the total cannot be divided by
    pub fn new(kind: QuotaKind, used: f64, total: f64) -> Option<Self> {
        if !(total > 0.0) || !total.is_finite() || !used.is_finite() {
            return None;
        }
        Some(Self {
            kind,
            used: used.max(0.0),
            total,
        })
    }

    /// Uncapped percent used, floored
    pub fn percent(&self) -> u32 {
        if self.used > 0.0 {
            floor_percent(self.used, self.total)
        } else {
            0
        }
    }

    /// Percent clamped for the visual width
    pub fn css_percent(&self) -> u32 {
        self.percent().min(100)
    }

    pub fn tier(&self) -> ColorTier {
        ColorTier::from_percent(self.percent())
    }
}

/// `floor(part / total * 100)`, saturating at zero for negative parts
pub fn floor_percent(part: f64, total: f64) -> u32 {
    ((part / total) * 100.0).floor() as u32
}

/// `round(part / total * 100)`, saturating at zero for negative parts
pub fn round_percent(part: f64, total: f64) -> u32 {
    ((part / total) * 100.0).round() as u32
}
