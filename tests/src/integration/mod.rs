//! # Integration Flows

mod backend;
mod indexing;
