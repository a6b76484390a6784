//! Human-readable descriptions of pockets and their contents.
//!
//! This module owns the content and ordering of the description lines;
//! turning them into UI text, color, or layout is the caller's business.

use itertools::Itertools as _;

use crate::contents::ContainerSet;
use crate::pocket::{Pocket, PocketDefinition, PocketKind};

/// One line of description: a short label and its value, both plain text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InfoLine {
    pub label: String,
    pub value: String,
}

impl InfoLine {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        InfoLine {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl Pocket {
    /// Static description of what this pocket accepts and how it behaves,
    /// independent of current contents.
    pub fn general_info(&self, number: Option<usize>) -> Vec<InfoLine> {
        let def = self.definition();
        let mut lines = Vec::new();
        if let Some(n) = number {
            lines.push(InfoLine::new("Pocket", format!("{n}")));
        }
        match def.kind {
            PocketKind::Container => {
                lines.push(InfoLine::new("Maximum volume", def.max_volume.to_string()));
                lines.push(InfoLine::new("Maximum weight", def.max_weight.to_string()));
            }
            PocketKind::Magazine => {
                lines.push(InfoLine::new("Holds", "ammunition".to_owned()));
            }
            PocketKind::Legacy => {}
        }
        if def.min_item_volume > crate::units::Volume::ZERO {
            lines.push(InfoLine::new(
                "Minimum item volume",
                def.min_item_volume.to_string(),
            ));
        }
        if def.rigid {
            lines.push(InfoLine::new(
                "Rigid",
                "takes up its full size whether or not it is full",
            ));
        }
        if def.watertight {
            lines.push(InfoLine::new("Watertight", "can hold liquids"));
        }
        if def.gastight {
            lines.push(InfoLine::new("Gastight", "can hold gases"));
        }
        if def.fire_protection {
            lines.push(InfoLine::new(
                "Fire protection",
                "protects contents from fire",
            ));
        }
        if def.open_on_contact {
            lines.push(InfoLine::new(
                "Open",
                "spills when put away or stowed",
            ));
        }
        if *def.spoil_multiplier != 1.0 {
            lines.push(InfoLine::new(
                "Spoilage",
                format!("contents spoil at {:.0}% of the usual rate", *def.spoil_multiplier * 100.0),
            ));
        }
        if !def.flag_restriction.is_empty() {
            lines.push(InfoLine::new(
                "Restriction",
                format!("holds only: {}", def.flag_restriction.iter().join(", ")),
            ));
        }
        if !def.ammo_restriction.is_empty() {
            lines.push(InfoLine::new(
                "Ammunition",
                def.ammo_restriction.iter().join(", "),
            ));
        }
        lines.push(InfoLine::new(
            "Base moves to remove item",
            def.extraction_cost.to_string(),
        ));
        lines
    }

    /// Description of what the pocket currently holds.
    pub fn contents_info(&self) -> Vec<InfoLine> {
        let mut lines = vec![
            InfoLine::new(
                "Volume",
                format!("{} of {}", self.contains_volume(), self.volume_capacity()),
            ),
            InfoLine::new(
                "Weight",
                format!(
                    "{} of {}",
                    self.contains_weight(),
                    self.definition().max_weight
                ),
            ),
        ];
        for item in self.items() {
            let value = if item.charges() > 1 {
                format!("{} ({})", item.id(), item.charges())
            } else {
                item.id().to_string()
            };
            lines.push(InfoLine::new("Contents", value));
        }
        lines
    }
}

impl ContainerSet {
    /// Full description of the set: each distinct pocket definition once,
    /// with a count when several pockets share it, then its general and
    /// contents lines. Legacy pockets are a loading artifact and are not
    /// described. Pocket numbers are shown only when the set has more than
    /// one described pocket.
    pub fn info(&self) -> Vec<InfoLine> {
        let described: Vec<&Pocket> = self
            .pockets()
            .iter()
            .filter(|p| !p.is(PocketKind::Legacy))
            .collect();
        let numbered = described.len() > 1;
        let mut lines = Vec::new();
        let mut seen: Vec<&PocketDefinition> = Vec::new();
        for (i, pocket) in described.iter().enumerate() {
            // General info is stated once per distinct definition (compared
            // by value), with a count; contents are reported for every
            // pocket, repeats included.
            if !seen.iter().any(|d| *d == pocket.definition()) {
                seen.push(pocket.definition());
                let copies = described
                    .iter()
                    .filter(|p| p.definition() == pocket.definition())
                    .count();
                if copies > 1 {
                    lines.push(InfoLine::new("Pockets", format!("{copies} with:")));
                    lines.extend(pocket.general_info(None));
                } else {
                    lines.extend(pocket.general_info(numbered.then_some(i + 1)));
                }
            }
            lines.extend(pocket.contents_info());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pocket::PocketDefinition;
    use crate::units::{Mass, Volume};
    use crate::Item;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn def(max_volume: i64) -> Arc<PocketDefinition> {
        Arc::new(PocketDefinition {
            max_volume: Volume::from_milliliters(max_volume),
            max_weight: Mass::from_grams(1000),
            ..PocketDefinition::default()
        })
    }

    #[test]
    fn general_info_lists_capacity_and_flags() {
        let pocket = Pocket::new(Arc::new(PocketDefinition {
            max_volume: Volume::from_liters(2),
            max_weight: Mass::from_kilograms(4),
            watertight: true,
            rigid: true,
            ..PocketDefinition::default()
        }));
        let lines = pocket.general_info(Some(1));
        let labels: Vec<&str> = lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Pocket",
                "Maximum volume",
                "Maximum weight",
                "Rigid",
                "Watertight",
                "Base moves to remove item",
            ]
        );
        assert_eq!(lines[1].value, "2 L");
        assert_eq!(lines[2].value, "4 kg");
    }

    #[test]
    fn contents_info_reports_usage_and_items() {
        let mut pocket = Pocket::new(def(1000));
        pocket
            .insert(Item::new("pebble", Volume::from_milliliters(30), Mass::from_grams(40)))
            .unwrap();
        let lines = pocket.contents_info();
        assert_eq!(lines[0], InfoLine {
            label: "Volume".to_owned(),
            value: "30 ml of 1 L".to_owned(),
        });
        assert_eq!(lines[2].value, "pebble");
    }

    #[test]
    fn set_info_groups_identical_pockets_and_skips_legacy() {
        // Equal-valued definitions group even when separately allocated.
        let set = ContainerSet::from_pockets(vec![
            Pocket::legacy(),
            Pocket::new(def(500)),
            Pocket::new(def(500)),
            Pocket::new(def(2000)),
        ]);
        let lines = set.info();
        assert_eq!(lines[0].label, "Pockets");
        assert_eq!(lines[0].value, "2 with:");
        // The legacy pocket produced nothing.
        assert!(lines.iter().all(|l| l.label != "Holds" || l.value != "legacy"));
    }

    #[test]
    fn set_info_reports_contents_of_every_grouped_pocket() {
        let shared = def(500);
        let mut set = ContainerSet::from_pockets(vec![
            Pocket::new(shared.clone()),
            Pocket::new(shared),
        ]);
        set.pocket_mut(0)
            .unwrap()
            .insert(Item::new("apple", Volume::from_milliliters(80), Mass::from_grams(100)))
            .unwrap();
        set.pocket_mut(1)
            .unwrap()
            .insert(Item::new("pear", Volume::from_milliliters(90), Mass::from_grams(110)))
            .unwrap();

        let lines = set.info();
        let contents: Vec<&str> = lines
            .iter()
            .filter(|l| l.label == "Contents")
            .map(|l| l.value.as_str())
            .collect();
        assert_eq!(contents, vec!["apple", "pear"]);
        // The shared definition is still described only once.
        assert_eq!(lines.iter().filter(|l| l.label == "Pockets").count(), 1);
        assert_eq!(
            lines.iter().filter(|l| l.label == "Maximum volume").count(),
            1
        );
    }
}
