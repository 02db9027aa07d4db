//! Implementations of [`AnalysisService`](crate::prelude::AnalysisService).

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpAnalysisService;
