//! Rendering of statement models into SQL text plus parameters.
//!
//! Rendering is the only place placeholders and parameter keys are produced.
//! Every statement model exposes `render(strategy)`, which walks the model
//! with a fresh [`RenderingContext`] and returns one of the statement
//! providers below.

mod context;
mod params;
mod provider;
mod strategy;

pub use context::RenderingContext;
pub(crate) use context::AliasScope;
pub use params::ParameterMap;
pub use provider::{
    BatchInsert, DeleteStatementProvider, InsertStatementProvider, SelectStatementProvider,
    StatementProvider, UpdateStatementProvider,
};
pub use strategy::RenderingStrategy;

/// Join non-empty SQL fragments with single spaces.
pub(crate) fn join_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(fragment);
    }
    out
}
