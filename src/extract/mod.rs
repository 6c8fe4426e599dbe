//! Per-layer extractors.
//!
//! Each extractor turns [`SourceFile`]s into one kind of entity. Per-file
//! problems come back as `Result<Vec<T>, Warning>` and are folded into a
//! [`LayerOutput`]; a whole layer either produces a `LayerOutput` or an
//! [`ExtractError`]. Nothing in here panics on bad input, and
//! [`guard_layer`] turns any panic that does escape into an error.

pub mod graphql;
pub mod resolvers;
pub mod routes;
pub mod rpc;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::error::{panic_message, ExtractError, Warning};
use crate::scanner::SourceFile;

pub use graphql::{discover_dependencies, extract_operations};
pub use resolvers::extract_resolvers;
pub use routes::extract_screens;
pub use rpc::extract_rpc_methods;

/// Entities of one layer together with the warnings raised producing them.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOutput<T> {
    pub entities: Vec<T>,
    pub warnings: Vec<Warning>,
}

impl<T> Default for LayerOutput<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> LayerOutput<T> {
    /// Fold one file's result in.
    pub fn push(&mut self, result: Result<Vec<T>, Warning>) {
        match result {
            Ok(entities) => self.entities.extend(entities),
            Err(warning) => self.warnings.push(warning),
        }
    }

    pub fn extend(&mut self, other: LayerOutput<T>) {
        self.entities.extend(other.entities);
        self.warnings.extend(other.warnings);
    }
}

impl<T> FromIterator<Result<Vec<T>, Warning>> for LayerOutput<T> {
    fn from_iter<I: IntoIterator<Item = Result<Vec<T>, Warning>>>(iter: I) -> Self {
        let mut output = LayerOutput::default();
        for result in iter {
            output.push(result);
        }
        output
    }
}

pub type LayerResult<T> = Result<LayerOutput<T>, ExtractError>;

/// Run one layer, converting a panic into [`ExtractError::Panicked`].
pub fn guard_layer<T>(layer: &str, run: impl FnOnce() -> LayerResult<T>) -> LayerResult<T> {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => result,
        Err(payload) => Err(ExtractError::Panicked {
            layer: layer.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Files under `dir`. An empty or `.` directory selects everything.
pub fn files_under<'a>(
    files: &'a [SourceFile],
    dir: &'a Path,
) -> impl Iterator<Item = &'a SourceFile> + 'a {
    let everything = dir.as_os_str().is_empty() || dir == Path::new(".");
    files
        .iter()
        .filter(move |f| everything || f.path.starts_with(dir))
}
