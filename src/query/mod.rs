//! Read-only queries over a built graph: filtering, diffing, impact and
//! subgraph selection. None of these need the extractors; they work on any
//! loaded graph document.

pub mod diff;
pub mod filter;
pub mod impact;
pub mod view;

pub use diff::{DiffSummary, GraphDiff};
pub use filter::ScreenFilter;
pub use impact::{ImpactReport, ImpactedScreen};
pub use view::{parse_layers, select, Selection, ViewOptions, DEFAULT_LAYERS};
