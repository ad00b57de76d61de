use serde::Serialize;

use super::QuotaKind;

pub const QUOTA_EXCEEDED: &str = "Quota Exceeded.";

/// Human-readable line shown below a quota bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaInfo {
    /// Usage figure without lead, e.g. "1.5 GB of 2 GB allotted memory."
    pub summary: String,
    pub projected: bool,
    /// Set when the (projected) usage is over quota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<&'static str>,
    pub message: String,
}

impl QuotaInfo {
    pub fn describe(kind: QuotaKind, used: f64, total: f64, projected: bool, under_quota: bool) -> Self {
        let summary = usage_summary(kind, used, total);

        let (remediation, message) = if under_quota {
            let lead = if projected { "You will use " } else { "You are using " };
            (None, format!("{}{}", lead, summary))
        } else {
            let hint = remediation_hint(kind);
            (Some(hint), format!("{} {}", QUOTA_EXCEEDED, hint))
        };

        Self {
            summary,
            projected,
            remediation,
            message,
        }
    }

    pub fn is_exceeded(&self) -> bool {
        self.remediation.is_some()
    }
}

fn usage_summary(kind: QuotaKind, used: f64, total: f64) -> String {
    match kind {
        QuotaKind::Cpu => format!("{} of {} available CPUs.", used, total),
        QuotaKind::Mem => format!("{} of {} GB allotted memory.", format_memory(used), total / 1024.0),
        QuotaKind::Disk => format!("{} of {} GB available storage.", used, total),
        QuotaKind::DiskCount => format!("{} of {} available volumes.", used, total),
    }
}

/// MB below 1024, GB above (no decimals when evenly divisible)
pub fn format_memory(mb: f64) -> String {
    if mb >= 1024.0 {
        let digits = if mb % 1024.0 == 0.0 { 0 } else { 1 };
        format!("{:.*} GB", digits, mb / 1024.0)
    } else {
        format!("{} MB", mb)
    }
}

fn remediation_hint(kind: QuotaKind) -> &'static str {
    match kind {
        QuotaKind::Cpu | QuotaKind::Mem => "Choose a smaller size or terminate a running instance.",
        QuotaKind::Disk => "Choose a smaller size or destroy an existing volume.",
        QuotaKind::DiskCount => "You must destroy an existing volume or request more resources.",
    }
}
