//! Data types which represent container state in formats explicitly designed
//! for serialization, and versioned to ensure ability to deserialize older
//! data.
//!
//! As a general rule, types in this file should avoid referring to types
//! outside this file, except where specifically intended, so that changes to
//! internal representations do not accidentally leak into the save format via
//! `#[derive(Serialize, Deserialize)]`. The exceptions here are the small
//! data-less enums [`PocketKind`], [`Phase`], and [`ItemClass`], whose
//! variant names are part of the format on purpose.
//!
//! General properties of the schema:
//!
//! * Volumes are integer milliliters; weights are integer grams.
//! * Fields equal to their defaults are omitted.
//! * Restriction sets are sorted arrays of strings.

use serde::{Deserialize, Serialize};

use crate::item::{ItemClass, Phase};
use crate::pocket::PocketKind;

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub(crate) enum ContainerSetSer {
    ContainerSetV1 {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pockets: Vec<PocketSer>,
    },
}

impl ContainerSetSer {
    pub(crate) fn is_empty(&self) -> bool {
        let ContainerSetSer::ContainerSetV1 { pockets } = self;
        pockets.is_empty()
    }
}

pub(crate) fn empty_set() -> ContainerSetSer {
    ContainerSetSer::ContainerSetV1 {
        pockets: Vec::new(),
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub(crate) enum PocketSer {
    PocketV1 {
        definition: PocketDefSer,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        contents: Vec<ItemSer>,
    },
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub(crate) enum PocketDefSer {
    PocketDefV1 {
        #[serde(default, skip_serializing_if = "is_default")]
        kind: PocketKind,
        #[serde(default, skip_serializing_if = "is_default")]
        max_volume: i64,
        #[serde(default, skip_serializing_if = "is_default")]
        min_item_volume: i64,
        #[serde(default, skip_serializing_if = "is_default")]
        max_weight: i64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        ammo_restriction: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        flag_restriction: Vec<String>,
        #[serde(default, skip_serializing_if = "is_default")]
        rigid: bool,
        #[serde(default, skip_serializing_if = "is_default")]
        watertight: bool,
        #[serde(default, skip_serializing_if = "is_default")]
        gastight: bool,
        #[serde(default, skip_serializing_if = "is_default")]
        open_on_contact: bool,
        #[serde(default, skip_serializing_if = "is_default")]
        fire_protection: bool,
        #[serde(default = "return_one_f32", skip_serializing_if = "is_one_f32")]
        spoil_multiplier: f32,
        #[serde(default = "return_one_f32", skip_serializing_if = "is_one_f32")]
        weight_multiplier: f32,
        #[serde(default = "return_hundred", skip_serializing_if = "is_hundred")]
        extraction_cost: u32,
    },
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub(crate) enum ItemSer {
    ItemV1 {
        id: String,
        #[serde(default = "return_one_u32", skip_serializing_if = "is_one_u32")]
        charges: u32,
        #[serde(default, skip_serializing_if = "is_default")]
        volume: i64,
        #[serde(default, skip_serializing_if = "is_default")]
        weight: i64,
        #[serde(default, skip_serializing_if = "is_default")]
        phase: Phase,
        #[serde(default, skip_serializing_if = "is_default")]
        class: ItemClass,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ammo: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rot: Option<f32>,
        #[serde(default, skip_serializing_if = "is_default")]
        explodes_in_fire: bool,
        #[serde(default = "empty_set", skip_serializing_if = "ContainerSetSer::is_empty")]
        contents: ContainerSetSer,
    },
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn return_one_f32() -> f32 {
    1.0
}
fn is_one_f32(value: &f32) -> bool {
    *value == 1.0
}

fn return_one_u32() -> u32 {
    1
}
fn is_one_u32(value: &u32) -> bool {
    *value == 1
}

fn return_hundred() -> u32 {
    100
}
fn is_hundred(value: &u32) -> bool {
    *value == 100
}
