use serde::Serialize;
use thiserror::Error;

use super::instance::find_size;
use super::{Instance, InstanceSize, QuotaKind, Volume};

/// Used and total quota units of one kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Usage {
    pub used: f64,
    pub total: f64,
    /// Active instances whose size could not be resolved (not counted)
    pub unresolved: usize,
}

impl Usage {
    pub fn new(used: f64, total: f64) -> Self {
        Self {
            used,
            total,
            unresolved: 0,
        }
    }
}

/// Why usage for a chart could not be determined.
///
/// The display text is what the chart shows under its "Unavailable" bar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Could not fetch {0} quota.")]
    Quota(QuotaKind),

    #[error("Could not fetch volume {}", volume_noun(.0))]
    Volumes(QuotaKind),

    #[error("Could not fetch instance {}", instance_noun(.0))]
    Instances(QuotaKind),

    #[error("Could not fetch instance types.")]
    Sizes(QuotaKind),

    #[error("Could not calculate resource usage for {}", calculation_noun(.0))]
    NoSizes(QuotaKind),

    #[error("Could not calculate {0} usage.")]
    Degenerate(QuotaKind),
}

impl UsageError {
    pub fn kind(&self) -> QuotaKind {
        match self {
            Self::Quota(kind)
            | Self::Volumes(kind)
            | Self::Instances(kind)
            | Self::Sizes(kind)
            | Self::NoSizes(kind)
            | Self::Degenerate(kind) => *kind,
        }
    }
}

fn volume_noun(kind: &QuotaKind) -> &'static str {
    if *kind == QuotaKind::Disk {
        "capacity quota."
    } else {
        "quantity quota."
    }
}

fn instance_noun(kind: &QuotaKind) -> &'static str {
    if *kind == QuotaKind::Mem {
        "memory quota."
    } else {
        "CPU quota."
    }
}

fn calculation_noun(kind: &QuotaKind) -> &'static str {
    if *kind == QuotaKind::Cpu {
        "CPU usage"
    } else {
        "memory usage"
    }
}

/// Sum volume usage: total capacity for `disk`, count for `disk_count`
pub fn volume_usage(kind: QuotaKind, volumes: &[Volume]) -> f64 {
    match kind {
        QuotaKind::DiskCount => volumes.len() as f64,
        _ => volumes.iter().map(|v| v.size).sum(),
    }
}

/// Sum the CPU or memory consumed by active instances.
///
/// Returns the sum and the number of active instances whose size alias
/// matched no known size.
pub fn instance_usage(kind: QuotaKind, instances: &[Instance], sizes: &[InstanceSize]) -> (f64, usize) {
    let mut used = 0.0;
    let mut unresolved = 0;

    for instance in instances.iter().filter(|i| i.is_active()) {
        match find_size(sizes, &instance.size_alias) {
            Some(size) => {
                used += match kind {
                    QuotaKind::Mem => size.mem,
                    _ => size.cpu,
                }
            }
            None => {
                tracing::warn!(
                    "Instance {} has unknown size '{}', not counted towards {} usage",
                    instance.name,
                    instance.size_alias,
                    kind
                );
                unresolved += 1;
            }
        }
    }

    (used, unresolved)
}
