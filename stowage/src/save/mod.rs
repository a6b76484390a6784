//! Serialization of the container model (`save` feature).
//!
//! The on-disk format is versioned: every schema type carries a `"type"` tag
//! ending in `V1`, so a future format revision can add `V2` variants and keep
//! reading old data.

pub(crate) mod conversion;
pub(crate) mod schema;

#[cfg(test)]
mod tests;
