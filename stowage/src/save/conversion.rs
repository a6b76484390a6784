//! Conversion between the types in [`super::schema`] and those used in
//! normal operation.

use std::collections::BTreeSet;
use std::sync::Arc;

use ordered_float::NotNan;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use super::schema;
use crate::contents::ContainerSet;
use crate::item::Item;
use crate::pocket::{Pocket, PocketDefinition};
use crate::units::{Mass, Volume};

impl Serialize for ContainerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        set_to_schema(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContainerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        set_from_schema(schema::ContainerSetSer::deserialize(deserializer)?)
            .map_err(de::Error::custom)
    }
}

impl Serialize for Pocket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        pocket_to_schema(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pocket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        pocket_from_schema(schema::PocketSer::deserialize(deserializer)?)
            .map_err(de::Error::custom)
    }
}

impl Serialize for PocketDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        def_to_schema(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PocketDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        def_from_schema(schema::PocketDefSer::deserialize(deserializer)?)
            .map_err(de::Error::custom)
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        item_to_schema(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        item_from_schema(schema::ItemSer::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

fn set_to_schema(set: &ContainerSet) -> schema::ContainerSetSer {
    schema::ContainerSetSer::ContainerSetV1 {
        pockets: set.pockets().iter().map(pocket_to_schema).collect(),
    }
}

fn set_from_schema(ser: schema::ContainerSetSer) -> Result<ContainerSet, String> {
    let schema::ContainerSetSer::ContainerSetV1 { pockets } = ser;
    Ok(ContainerSet::from_pockets(
        pockets
            .into_iter()
            .map(pocket_from_schema)
            .collect::<Result<Vec<Pocket>, String>>()?,
    ))
}

fn pocket_to_schema(pocket: &Pocket) -> schema::PocketSer {
    schema::PocketSer::PocketV1 {
        definition: def_to_schema(pocket.definition()),
        contents: pocket.items().iter().map(item_to_schema).collect(),
    }
}

fn pocket_from_schema(ser: schema::PocketSer) -> Result<Pocket, String> {
    let schema::PocketSer::PocketV1 {
        definition,
        contents,
    } = ser;
    let mut pocket = Pocket::new(Arc::new(def_from_schema(definition)?));
    // Contents are restored as saved, constraints notwithstanding; a later
    // overflow pass deals with data that no longer fits its pocket.
    for item in contents {
        pocket.force_insert(item_from_schema(item)?);
    }
    Ok(pocket)
}

fn def_to_schema(def: &PocketDefinition) -> schema::PocketDefSer {
    schema::PocketDefSer::PocketDefV1 {
        kind: def.kind,
        max_volume: def.max_volume.milliliters(),
        min_item_volume: def.min_item_volume.milliliters(),
        max_weight: def.max_weight.grams(),
        ammo_restriction: def.ammo_restriction.iter().map(|a| a.to_string()).collect(),
        flag_restriction: def.flag_restriction.iter().map(|f| f.to_string()).collect(),
        rigid: def.rigid,
        watertight: def.watertight,
        gastight: def.gastight,
        open_on_contact: def.open_on_contact,
        fire_protection: def.fire_protection,
        spoil_multiplier: def.spoil_multiplier.into_inner(),
        weight_multiplier: def.weight_multiplier.into_inner(),
        extraction_cost: def.extraction_cost,
    }
}

fn def_from_schema(ser: schema::PocketDefSer) -> Result<PocketDefinition, String> {
    let schema::PocketDefSer::PocketDefV1 {
        kind,
        max_volume,
        min_item_volume,
        max_weight,
        ammo_restriction,
        flag_restriction,
        rigid,
        watertight,
        gastight,
        open_on_contact,
        fire_protection,
        spoil_multiplier,
        weight_multiplier,
        extraction_cost,
    } = ser;
    Ok(PocketDefinition {
        kind,
        max_volume: Volume::from_milliliters(max_volume),
        min_item_volume: Volume::from_milliliters(min_item_volume),
        max_weight: Mass::from_grams(max_weight),
        ammo_restriction: ammo_restriction.into_iter().map(Into::into).collect(),
        flag_restriction: flag_restriction.into_iter().map(Into::into).collect(),
        rigid,
        watertight,
        gastight,
        open_on_contact,
        fire_protection,
        spoil_multiplier: not_nan(spoil_multiplier, "spoil_multiplier")?,
        weight_multiplier: not_nan(weight_multiplier, "weight_multiplier")?,
        extraction_cost,
    })
}

fn item_to_schema(item: &Item) -> schema::ItemSer {
    schema::ItemSer::ItemV1 {
        id: item.id.to_string(),
        charges: item.charges,
        volume: item.volume.milliliters(),
        weight: item.weight.grams(),
        phase: item.phase,
        class: item.class,
        tags: item.tags.iter().map(|t| t.to_string()).collect(),
        ammo: item.ammo.as_ref().map(|a| a.to_string()),
        rot: item.rot.map(NotNan::into_inner),
        explodes_in_fire: item.explodes_in_fire,
        contents: set_to_schema(&item.contents),
    }
}

fn item_from_schema(ser: schema::ItemSer) -> Result<Item, String> {
    let schema::ItemSer::ItemV1 {
        id,
        charges,
        volume,
        weight,
        phase,
        class,
        tags,
        ammo,
        rot,
        explodes_in_fire,
        contents,
    } = ser;
    Ok(Item {
        id: id.into(),
        charges,
        volume: Volume::from_milliliters(volume),
        weight: Mass::from_grams(weight),
        phase,
        class,
        tags: tags.into_iter().map(Into::into).collect::<BTreeSet<_>>(),
        ammo: ammo.map(Into::into),
        rot: rot.map(|r| not_nan(r, "rot")).transpose()?,
        explodes_in_fire,
        contents: set_from_schema(contents)?,
    })
}

fn not_nan(value: f32, field: &str) -> Result<NotNan<f32>, String> {
    NotNan::new(value).map_err(|_| format!("{field} must not be NaN"))
}
