pub mod chart;
pub mod identity;
pub mod info;
pub mod instance;
pub mod quota;
pub mod usage;
pub mod volume;

pub use chart::{BarSegment, ChartView, QuotaChart, RenderedChart, SegmentRole};
pub use identity::{Group, IdentityDetail, IdentityRef, Profile};
pub use info::QuotaInfo;
pub use instance::{Instance, InstanceRow, InstanceSize};
pub use quota::{ColorTier, Quota, QuotaKind, QuotaState};
pub use usage::{Usage, UsageError};
pub use volume::{Attachment, Volume, VolumeRow};
