pub mod datasets;
pub mod definition;
pub mod entity;
pub mod filters;
pub mod schedule;
pub mod sources;
pub mod visuals;

pub use datasets::Dataset;
pub use definition::DashboardDefinition;
pub use entity::{EntityKind, EntityRef, EntitySpec, Identified};
pub use filters::{Filter, FilterControl};
pub use schedule::{RefreshFrequency, RefreshSchedule, REFRESH_SCHEDULE_ID};
pub use sources::DataSource;
pub use visuals::{AxisBindings, Chart, Position, SliceBindings, Visual};
