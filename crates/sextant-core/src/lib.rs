//! Sextant Core Types and Definitions
//!
//! This crate provides the foundational types shared by every Sextant
//! component. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Elements**: The typed element catalog of one document ([`element`] module)
//! - **Corpus**: Documents, the explicit mapping table and the corpus ([`corpus`] module)
//! - **Errors**: Diagnostics, error codes and severities ([`error`] module)

pub mod corpus;
pub mod element;
pub mod error;
pub mod identifier;
