//! # panelforge-domain
//!
//! Pure domain model for the panelforge installation compiler.
//!
//! ## Responsibilities
//! - Foundational types: typed source identifiers, GUIDs, error conventions, timestamps
//! - Define the **source model**: the read-only project snapshot
//!   (areas → rooms → boards → modules, circuits, keypads, scenes)
//! - Define the **module catalog**: channel layout, slot kinds, and current
//!   ratings per module type
//! - Define the **document model**: the closed set of node types emitted to
//!   the third-party programming software
//! - Contain all invariant enforcement that does not need the whole project
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod catalog;
pub mod circuit;
pub mod document;
pub mod electrical;
pub mod keypad;
pub mod module;
pub mod project;
pub mod scene;
