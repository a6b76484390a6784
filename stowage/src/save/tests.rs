use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{from_value, json, to_value};

use crate::contents::ContainerSet;
use crate::item::{Item, Phase};
use crate::pocket::{PocketDefinition, PocketKind};
use crate::units::{Mass, Volume};

fn jar_definition() -> Arc<PocketDefinition> {
    Arc::new(PocketDefinition {
        max_volume: Volume::from_milliliters(500),
        max_weight: Mass::from_grams(800),
        watertight: true,
        rigid: true,
        ..PocketDefinition::default()
    })
}

#[test]
fn item_json_shape() {
    let item = Item::new("rock", Volume::from_milliliters(100), Mass::from_grams(200));
    assert_eq!(
        to_value(&item).unwrap(),
        json!({
            "type": "ItemV1",
            "id": "rock",
            "volume": 100,
            "weight": 200,
        }),
    );
}

#[test]
fn item_json_shape_with_everything() {
    let round = Item::new("9mm_fmj", Volume::from_milliliters(10), Mass::from_grams(8))
        .with_charges(50)
        .with_ammo("9mm")
        .with_tag("RELOADED");
    assert_eq!(
        to_value(&round).unwrap(),
        json!({
            "type": "ItemV1",
            "id": "9mm_fmj",
            "charges": 50,
            "volume": 10,
            "weight": 8,
            "class": "Ammo",
            "tags": ["RELOADED"],
            "ammo": "9mm",
        }),
    );
}

#[test]
fn definition_json_shape() {
    assert_eq!(
        to_value(&*jar_definition()).unwrap(),
        json!({
            "type": "PocketDefV1",
            "max_volume": 500,
            "max_weight": 800,
            "rigid": true,
            "watertight": true,
        }),
    );
}

#[test]
fn set_json_shape() {
    let mut set = ContainerSet::from_definitions([jar_definition()]);
    set.insert(
        Item::new("water", Volume::from_milliliters(250), Mass::from_grams(250))
            .with_phase(Phase::Liquid),
        PocketKind::Container,
    )
    .unwrap();
    assert_eq!(
        to_value(&set).unwrap(),
        json!({
            "type": "ContainerSetV1",
            "pockets": [{
                "type": "PocketV1",
                "definition": {
                    "type": "PocketDefV1",
                    "max_volume": 500,
                    "max_weight": 800,
                    "rigid": true,
                    "watertight": true,
                },
                "contents": [{
                    "type": "ItemV1",
                    "id": "water",
                    "volume": 250,
                    "weight": 250,
                    "phase": "Liquid",
                }],
            }],
        }),
    );
}

#[test]
fn item_defaults_apply_when_fields_missing() {
    let item: Item = from_value(json!({"type": "ItemV1", "id": "stick"})).unwrap();
    assert_eq!(item.id(), "stick");
    assert_eq!(item.charges(), 1);
    assert_eq!(item.phase(), Phase::Solid);
    assert_eq!(item.volume(), Volume::from_milliliters(0));
    assert!(item.contents().pockets().is_empty());
}

#[test]
fn nested_set_round_trip() {
    let mag_well = Arc::new(PocketDefinition {
        ammo_restriction: BTreeSet::from([arcstr::literal!("9mm")]),
        ..PocketDefinition::default()
    });
    let gun = Item::new("pistol", Volume::from_milliliters(600), Mass::from_grams(700))
        .with_pockets(ContainerSet::from_definitions([mag_well]));

    let mut set = ContainerSet::from_definitions([jar_definition()]);
    set.pocket_mut(0).unwrap().force_insert(gun);
    set.pocket_mut(0)
        .unwrap()
        .force_insert(Item::new("pebble", Volume::from_milliliters(5), Mass::from_grams(10)));

    let back: ContainerSet = from_value(to_value(&set).unwrap()).unwrap();
    assert_eq!(back, set);
    assert!(back.same_contents(&set));
    assert!(back.stacks_with(&set));
}

#[test]
fn legacy_pocket_round_trips() {
    let set = ContainerSet::from_legacy([
        Item::new("coin", Volume::from_milliliters(1), Mass::from_grams(9)).with_charges(12),
    ]);
    let back: ContainerSet = from_value(to_value(&set).unwrap()).unwrap();
    assert_eq!(back, set);
    assert_eq!(back.legacy_pocket().map(|p| p.len()), Some(1));
}
