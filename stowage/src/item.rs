//! [`Item`] and the narrow interfaces through which items leave the container
//! model ([`DropSink`], [`Carrier`]).
//!
//! The container model treats almost everything about an item as a read-only
//! fact: its volume, weight, phase, tags, and classification are stored data,
//! not computed here. What this module does own is the recursion anchor —
//! every item carries a [`ContainerSet`] of its own pockets — and the handful
//! of behavior hooks (detonation, rot, charge consumption) that pocket folds
//! delegate to.

use std::collections::BTreeSet;

use arcstr::ArcStr;
use ordered_float::NotNan;

use crate::contents::ContainerSet;
use crate::units::{Mass, Volume};

/// Identifier of an item type (e.g. `"water_clean"`).
///
/// This is currently a type alias; it will always be a cheaply clonable string.
pub type ItemId = ArcStr;

/// A tag carried by an item, matched against pocket flag restrictions.
pub type Tag = ArcStr;

/// Identifier of an ammunition type (e.g. `"9mm"`), matched against pocket
/// ammo restrictions.
pub type AmmoType = ArcStr;

/// Tags with meaning to the container model itself.
pub mod tag {
    use super::Tag;

    /// Marks a spent casing, ejected by [`casings_handle`](crate::pocket::Pocket::casings_handle).
    pub static CASING: Tag = arcstr::literal!("CASING");
}

/// The physical phase of an item, gating which pockets may hold it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "save", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Ordinary solid matter; no special pocket support needed.
    #[default]
    Solid,
    /// Requires a watertight pocket, and will not share one with anything it
    /// cannot stack with.
    Liquid,
    /// Requires a gastight pocket, with the same exclusivity as liquids.
    Gas,
}

/// Coarse classification of an item, used for kind-dispatched pocket folds
/// (ammo consumption, mod stripping, magazine lookup).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "save", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemClass {
    /// No special handling.
    #[default]
    Generic,
    /// Ammunition; eligible for ammo-restricted pockets.
    Ammo,
    /// A magazine; what [`magazine_current`](ContainerSet::magazine_current) looks for.
    Magazine,
    /// A gun modification.
    GunMod,
    /// A tool modification.
    ToolMod,
}

/// One item in the simulation.
///
/// An `Item` may own pockets of its own (its [`contents`](Self::contents)),
/// making containment recursive. Ownership is strictly tree-shaped: an item
/// in a pocket is owned by that pocket and nothing else, so the containment
/// graph cannot contain a cycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) charges: u32,
    pub(crate) volume: Volume,
    pub(crate) weight: Mass,
    pub(crate) phase: Phase,
    pub(crate) class: ItemClass,
    pub(crate) tags: BTreeSet<Tag>,
    pub(crate) ammo: Option<AmmoType>,
    /// Spoilage progress as a fraction of shelf life; `None` = never spoils.
    pub(crate) rot: Option<NotNan<f32>>,
    pub(crate) explodes_in_fire: bool,
    pub(crate) contents: ContainerSet,
}

impl Item {
    /// Constructs a plain solid item with one charge and no pockets.
    pub fn new(id: impl Into<ItemId>, volume: Volume, weight: Mass) -> Self {
        Item {
            id: id.into(),
            charges: 1,
            volume,
            weight,
            phase: Phase::Solid,
            class: ItemClass::Generic,
            tags: BTreeSet::new(),
            ammo: None,
            rot: None,
            explodes_in_fire: false,
            contents: ContainerSet::new(),
        }
    }

    /// Sets the charge count. Charges are an opaque stack size to this crate;
    /// only equality relations and ammo consumption look at them.
    #[must_use]
    pub fn with_charges(mut self, charges: u32) -> Self {
        self.charges = charges;
        self
    }

    /// Sets the physical phase.
    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Sets the classification.
    #[must_use]
    pub fn with_class(mut self, class: ItemClass) -> Self {
        self.class = class;
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Marks this item as ammunition of the given type.
    #[must_use]
    pub fn with_ammo(mut self, ammo: impl Into<AmmoType>) -> Self {
        self.ammo = Some(ammo.into());
        self.class = ItemClass::Ammo;
        self
    }

    /// Marks this item as perishable, starting fresh.
    #[must_use]
    pub fn perishable(mut self) -> Self {
        self.rot = Some(NotNan::new(0.0).unwrap());
        self
    }

    /// Marks this item as exploding when exposed to fire.
    #[must_use]
    pub fn explosive(mut self) -> Self {
        self.explodes_in_fire = true;
        self
    }

    /// Attaches pockets built from the given definitions.
    #[must_use]
    pub fn with_pockets(mut self, contents: ContainerSet) -> Self {
        self.contents = contents;
        self
    }

    /// The item type identifier.
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Current charge count.
    pub fn charges(&self) -> u32 {
        self.charges
    }

    /// Volume of this item (the whole stack), not counting pocket contents.
    ///
    /// The full displayed volume of an item is this plus
    /// [`ContainerSet::item_size_modifier`].
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Weight of this item (the whole stack), not counting pocket contents.
    pub fn weight(&self) -> Mass {
        self.weight
    }

    /// Volume including contents carried in this item's own pockets
    /// (rigid pockets contribute nothing; see
    /// [`ContainerSet::item_size_modifier`]).
    pub fn full_volume(&self) -> Volume {
        self.volume + self.contents.item_size_modifier()
    }

    /// Weight including contents carried in this item's own pockets, after
    /// per-pocket weight multipliers.
    pub fn full_weight(&self) -> Mass {
        self.weight + self.contents.item_weight_modifier()
    }

    /// Whether fire reaching this item would set it (or anything it carries)
    /// off.
    pub fn will_explode_in_fire(&self) -> bool {
        self.explodes_in_fire || self.contents.will_explode_in_fire()
    }

    /// The item's physical phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The item's classification.
    pub fn class(&self) -> ItemClass {
        self.class
    }

    /// Whether the item is made of the given phase.
    pub fn made_of(&self, phase: Phase) -> bool {
        self.phase == phase
    }

    /// The item's tag set.
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// Whether the item carries at least one of the given tags.
    pub fn has_any_tag(&self, tags: &BTreeSet<Tag>) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }

    /// The ammunition type, if this item is ammunition.
    pub fn ammo(&self) -> Option<&AmmoType> {
        self.ammo.as_ref()
    }

    /// Whether this item is ammunition with a known ammo type.
    pub fn is_ammo(&self) -> bool {
        self.class == ItemClass::Ammo && self.ammo.is_some()
    }

    /// Whether this item is a magazine.
    pub fn is_magazine(&self) -> bool {
        self.class == ItemClass::Magazine
    }

    /// Whether this item is a tool or gun modification.
    pub fn is_mod(&self) -> bool {
        matches!(self.class, ItemClass::GunMod | ItemClass::ToolMod)
    }

    /// Whether this item spoils over time.
    pub fn spoils(&self) -> bool {
        self.rot.is_some()
    }

    /// Whether this item explodes when its container burns.
    pub fn explodes_in_fire(&self) -> bool {
        self.explodes_in_fire
    }

    /// The pockets this item owns.
    pub fn contents(&self) -> &ContainerSet {
        &self.contents
    }

    /// Mutable access to the pockets this item owns.
    pub fn contents_mut(&mut self) -> &mut ContainerSet {
        &mut self.contents
    }

    /// Whether two items may merge into one inventory stack.
    ///
    /// Charges are deliberately not compared; merging stacks is exactly the
    /// act of combining different charge counts. Contained items must match
    /// pocket-for-pocket (see [`ContainerSet::stacks_with`]).
    pub fn stacks_with(&self, other: &Item) -> bool {
        self.id == other.id
            && self.phase == other.phase
            && self.class == other.class
            && self.tags == other.tags
            && self.ammo == other.ammo
            && self.contents.stacks_with(&other.contents)
    }

    /// Content-identity comparison: same type and same charge count.
    pub fn same_content_as(&self, other: &Item) -> bool {
        self.id == other.id && self.charges == other.charges
    }

    /// Advances spoilage by `amount` (a fraction of shelf life, already scaled
    /// by the containing pocket). Returns true when the item has fully rotted.
    pub(crate) fn tick_rot(&mut self, amount: NotNan<f32>) -> bool {
        match &mut self.rot {
            Some(rot) => {
                *rot += amount;
                rot.into_inner() >= 1.0
            }
            None => false,
        }
    }

    /// Consumes up to `qty` charges, scaling volume and weight down with the
    /// stack. Returns the number of charges actually consumed.
    pub(crate) fn consume_charges(&mut self, qty: u32) -> u32 {
        let before = self.charges;
        let used = qty.min(before);
        if used > 0 {
            let after = before - used;
            self.volume = Volume::from_milliliters(
                self.volume.milliliters() * i64::from(after) / i64::from(before),
            );
            self.weight =
                Mass::from_grams(self.weight.grams() * i64::from(after) / i64::from(before));
            self.charges = after;
        }
        used
    }

    /// Fire has reached this item. If it is explosive it destroys itself,
    /// spilling its own contents into `drops`; returns whether it detonated.
    pub(crate) fn detonate(&mut self, drops: &mut Vec<Item>) -> bool {
        if self.explodes_in_fire {
            self.contents.spill_contents(drops);
            true
        } else {
            false
        }
    }
}

/// Destination for items evicted from a pocket (overflow, spills, detonation
/// debris). In the full game this is a map cell; in tests it is a `Vec`.
///
/// Deposit is assumed to always succeed; the world accepts unbounded drops.
pub trait DropSink {
    /// Accepts ownership of an evicted item.
    fn deposit(&mut self, item: Item);
}

impl DropSink for Vec<Item> {
    fn deposit(&mut self, item: Item) {
        self.push(item);
    }
}

/// The actor holding a container, as seen by bulk-removal operations.
///
/// Extraction costs time; stripped items go to whoever is doing the
/// stripping (who may in turn drop them, with their own notification — not
/// this crate's concern).
pub trait Carrier {
    /// Charges the actor `cost` time units for handling one item.
    fn charge_time(&mut self, cost: u32);

    /// Hands the actor ownership of an item removed on their behalf.
    fn acquire(&mut self, item: Item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn water() -> Item {
        Item::new("water", Volume::from_milliliters(250), Mass::from_grams(250))
            .with_phase(Phase::Liquid)
    }

    #[test]
    fn stacking_ignores_charges_but_not_type() {
        let a = water().with_charges(2);
        let b = water().with_charges(5);
        assert!(a.stacks_with(&b));
        assert!(!a.same_content_as(&b));

        let c = Item::new("vinegar", Volume::from_milliliters(250), Mass::from_grams(250))
            .with_phase(Phase::Liquid);
        assert!(!a.stacks_with(&c));
    }

    #[test]
    fn consume_charges_scales_stack() {
        let mut mag = Item::new("9mm", Volume::from_milliliters(50), Mass::from_grams(120))
            .with_ammo("9mm")
            .with_charges(10);
        assert_eq!(mag.consume_charges(4), 4);
        assert_eq!(mag.charges(), 6);
        assert_eq!(mag.volume(), Volume::from_milliliters(30));
        assert_eq!(mag.weight(), Mass::from_grams(72));
        // Demanding more than remains drains the stack.
        assert_eq!(mag.consume_charges(100), 6);
        assert_eq!(mag.charges(), 0);
        assert_eq!(mag.volume(), Volume::ZERO);
    }

    #[test]
    fn rot_progress() {
        let mut bread =
            Item::new("bread", Volume::from_milliliters(100), Mass::from_grams(80)).perishable();
        assert!(bread.spoils());
        assert!(!bread.tick_rot(NotNan::new(0.5).unwrap()));
        assert!(bread.tick_rot(NotNan::new(0.5).unwrap()));
    }
}
