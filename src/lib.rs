//! yld: Tessera Yield Toolkit
//!
//! Projects multi-year semiconductor die yield from plain-text YAML process
//! data. The engine in [`core::engine`] is a pure function of an input
//! [`core::Document`]; everything else reads files and renders results.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
