//! Stowage is a constrained recursive container model: items have pockets,
//! pockets hold items, and every pocket enforces an immutable rule set
//! (volume, weight, phase, tag and ammunition restrictions) at its mouth.
//!
//! ## Data model
//!
//! * A [`PocketDefinition`] is the immutable, shared description of one kind
//!   of pocket slot. Definitions come from static item-type data and are
//!   shared between pocket instances via [`std::sync::Arc`].
//! * A [`Pocket`] is one live slot: a definition plus the ordered items
//!   currently inside it. Insertion is checked (and reports a typed
//!   [`ContainError`] on refusal); loading and migration paths may bypass
//!   the checks, and [`Pocket::overflow`] later restores the capacity
//!   invariant by evicting items.
//! * A [`ContainerSet`] is every pocket belonging to one item, and the home
//!   of the cross-pocket operations: the best-pocket placement search,
//!   aggregate capacity queries, kind-dispatched folds (ammo consumption,
//!   spoilage, detonation), and the bridge that migrates data saved in the
//!   older flat-list format.
//! * An [`Item`] carries a `ContainerSet` of its own, which is what makes
//!   containment recursive. Ownership is strictly tree-shaped, so the
//!   containment graph cannot contain a cycle.
//!
//! Placement is deterministic: [`ContainerSet::best_pocket`] ranks candidate
//! pockets by a fixed tie-break chain and returns a [`PocketPath`], which the
//! caller then resolves to perform the insertion.
//!
//! This crate is a model, not a game: it has no notion of maps, characters,
//! or UI, and item properties (volume, weight, tags) are inputs, not
//! simulation results. Description output ([`describe`]) is plain label/value
//! text for a renderer to format.
//!
//! ## Crate features
//!
//! * `save`:
//!   Enable [`serde`] serialization of the container model, in a versioned
//!   JSON-friendly schema.
//!
//! ## Dependencies and global state
//!
//! `stowage` avoids having any global state, but it does write log messages
//! using the [`log`] crate and is therefore subject to that global
//! configuration.
#![cfg_attr(not(feature = "save"), doc = "[`serde`]: https://docs.rs/serde/")]

pub mod contents;
pub mod describe;
pub mod item;
pub mod pocket;
#[cfg(feature = "save")]
mod save;
pub mod units;

pub use contents::{ContainerSet, PocketPath};
pub use item::{Item, ItemClass, Phase};
pub use pocket::{ContainError, InsertError, Pocket, PocketDefinition, PocketKind};
