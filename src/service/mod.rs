//! CrudService: generic CRUD using the safe SQL builder; fixed analytics queries.

pub mod analytics;
mod crud;
pub use analytics::{telemetry_overview, EventCount, TelemetryOverview};
pub use crud::{parse_id, row_to_json, CrudService};
