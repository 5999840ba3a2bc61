//! prepdeck - Culinary production schedule dashboard built on spreadsheet uploads
//!
//! This crate parses a production schedule spreadsheet (xlsx, xls, xlsb, ods),
//! normalizes its date cells, and computes KPIs and chart series for a
//! filterable dashboard. The result can be rendered as Markdown tables or JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use prepdeck::{DashboardBuilder, FilterSelection};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a dashboard with default settings
//!     let dashboard = DashboardBuilder::new().build()?;
//!
//!     // Parse the first sheet of the uploaded workbook
//!     let bytes = std::fs::read("schedule.xlsx")?;
//!     let dataset = dashboard.parse(&bytes)?;
//!
//!     // Summarize without filters and print as Markdown
//!     let view = dashboard.summarize(&dataset, &FilterSelection::new());
//!     dashboard.render(&view, std::io::stdout())?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Filtering
//!
//! ```rust
//! use prepdeck::{CellValue, DashboardBuilder, Dataset, FilterDimension, FilterSelection};
//!
//! # fn main() -> Result<(), prepdeck::PrepDeckError> {
//! let dashboard = DashboardBuilder::new().build()?;
//! let dataset = Dataset::new(
//!     ["Event", "Producer", "Qty"],
//!     vec![
//!         vec!["Gala".into(), "Chef A".into(), 5.0.into()],
//!         vec!["Gala".into(), "Chef A".into(), 3.0.into()],
//!         vec!["Brunch".into(), CellValue::Null, "x".into()],
//!     ],
//! );
//!
//! let selection = FilterSelection::new().with(FilterDimension::Event, "Gala");
//! let view = dashboard.summarize(&dataset, &selection);
//! assert_eq!(view.row_count, 2);
//! assert_eq!(view.kpis.total_qty, 8.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Reloading
//!
//! Uploads are tracked by generation. Only the most recently begun load can
//! replace the active dataset; older completions are discarded.
//!
//! ```rust,no_run
//! use prepdeck::{DashboardBuilder, LoadOutcome};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dashboard = DashboardBuilder::new().build()?;
//!     let mut state = dashboard.new_state();
//!
//!     let ticket = state.begin_load();
//!     let bytes = std::fs::read("schedule.xlsx")?;
//!     match dashboard.complete_load(&mut state, ticket, &bytes) {
//!         LoadOutcome::Applied => println!("{} rows", state.dataset().len()),
//!         LoadOutcome::Superseded => {}
//!         LoadOutcome::Rejected(err) => eprintln!("{}", err),
//!     }
//!
//!     Ok(())
//! }
//! ```

mod aggregate;
mod api;
mod builder;
mod error;
mod filter;
mod normalize;
mod output;
mod parser;
mod security;
mod state;
mod types;

// 公開API
pub use aggregate::{
    build_series, category_key, compute_kpis, filter_rows, group_count, group_sum, items_by_day,
    sort_descending, top_n, Bucket, DashboardSeries, KpiSummary, DEFAULT_TOP_N,
};
pub use api::{ColumnMapping, FallbackLabels, FilterDimension, OutputFormat, ReloadPolicy};
pub use builder::{Dashboard, DashboardBuilder, DEFAULT_PREVIEW_ROWS};
pub use error::PrepDeckError;
pub use filter::{available_values, FilterSelection, Selection, ALL_LABEL};
pub use normalize::{normalize_date, to_iso_date};
pub use output::DashboardView;
pub use parser::WorkbookParser;
pub use state::{DashboardState, LoadOutcome, LoadTicket};
pub use types::{CellValue, Dataset, Record};
