pub mod charts;
pub mod screen;
pub mod summary;
pub mod sync;
pub mod usage;

pub use charts::{ChartController, ChartRegistry, Direction, Preview, Refresh};
pub use screen::{Collections, InstanceScreen, InstanceScreenView};
pub use summary::{IdentityListing, IdentitySummary, SummaryService, Table};
pub use sync::StoreSync;
pub use usage::UsageService;
