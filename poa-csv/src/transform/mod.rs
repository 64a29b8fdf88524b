//! Assembly module.
//!
//! Builds the record of one manuscript from the table store:
//! - Steps: title, abstract, type, license, dates, ethics, datasets, lists
//! - Contributors: authors, group authors and the editor
//! - Funding: two-pass award assembly
//! - Pipeline: fixed step order, failure counting, all-or-nothing result

pub mod contributors;
pub mod funding;
pub mod pipeline;
pub mod steps;

pub use pipeline::*;
