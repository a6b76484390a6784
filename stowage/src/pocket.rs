//! [`Pocket`]: one constrained container slot, and [`PocketDefinition`], the
//! immutable rule set it enforces.

use std::collections::BTreeSet;
use std::sync::Arc;

use ordered_float::NotNan;

use crate::item::{AmmoType, Carrier, DropSink, Item, ItemId, Phase, Tag, tag};
use crate::units::{Mass, Volume};

/// The kind of a pocket slot, dispatching which operations apply to it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "save", derive(serde::Serialize, serde::Deserialize))]
pub enum PocketKind {
    /// An ordinary physical container pocket.
    #[default]
    Container,
    /// A magazine well; holds ammunition under ammo-count semantics.
    Magazine,
    /// The migration bridge for items loaded from the flat-list format.
    /// Accepts anything through the explicit legacy-insert path only, and is
    /// excluded from physical-constraint reporting and placement search.
    Legacy,
}

/// The immutable rule set one kind of pocket slot enforces.
///
/// Definitions are created once from static item-type data, shared between
/// pocket instances via [`Arc`], and compared by value. A definition is never
/// mutated after construction; when item types are redefined, pockets are
/// rebound to a new definition and [`Pocket::overflow`] restores the capacity
/// invariant.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct PocketDefinition {
    /// Which kind of pocket this is.
    pub kind: PocketKind,
    /// Maximum combined volume of contents.
    pub max_volume: Volume,
    /// Items smaller than this will not stay in the pocket.
    pub min_item_volume: Volume,
    /// Maximum combined weight of contents.
    pub max_weight: Mass,
    /// If non-empty, the pocket accepts ammunition of these types exclusively,
    /// and volume/weight accounting does not apply.
    pub ammo_restriction: BTreeSet<AmmoType>,
    /// If non-empty, only items carrying at least one of these tags fit.
    pub flag_restriction: BTreeSet<Tag>,
    /// The pocket's own size does not change with contents.
    pub rigid: bool,
    /// Can hold liquids.
    pub watertight: bool,
    /// Can hold gases.
    pub gastight: bool,
    /// Spills when the parent item is placed inside another container or worn.
    pub open_on_contact: bool,
    /// Shields contents from fire-triggered destruction.
    pub fire_protection: bool,
    /// Scales the spoilage rate of contained items.
    pub spoil_multiplier: NotNan<f32>,
    /// Scales the effective weight of contained items.
    pub weight_multiplier: NotNan<f32>,
    /// Base time cost to remove one item.
    pub extraction_cost: u32,
}

impl PocketDefinition {
    /// Constructs a definition of the given kind with no restrictions, zero
    /// capacity, and neutral multipliers. Intended to be completed with
    /// struct-update syntax or field assignment before first use.
    pub fn new(kind: PocketKind) -> Self {
        PocketDefinition {
            kind,
            max_volume: Volume::ZERO,
            min_item_volume: Volume::ZERO,
            max_weight: Mass::ZERO,
            ammo_restriction: BTreeSet::new(),
            flag_restriction: BTreeSet::new(),
            rigid: false,
            watertight: false,
            gastight: false,
            open_on_contact: false,
            fire_protection: false,
            spoil_multiplier: NotNan::new(1.0).unwrap(),
            weight_multiplier: NotNan::new(1.0).unwrap(),
            extraction_cost: 100,
        }
    }

    /// The reserved definition of the legacy bridge pocket: no rules at all.
    pub fn legacy() -> Self {
        PocketDefinition {
            extraction_cost: 0,
            ..Self::new(PocketKind::Legacy)
        }
    }
}

impl Default for PocketDefinition {
    fn default() -> Self {
        Self::new(PocketKind::Container)
    }
}

/// Reason a pocket cannot (or could not) contain an item.
///
/// All of these are recoverable: the caller may try another pocket, report to
/// the player, or drop the action.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum ContainError {
    /// legacy pockets must be filled through the legacy-insert path
    LegacyOnly,
    /// can't contain or mix liquid
    LiquidMismatch,
    /// can't contain or mix gas
    GasMismatch,
    /// item does not have a required flag
    FlagMismatch,
    /// item is not an accepted ammo type
    AmmoMismatch,
    /// item is too small to stay in this pocket
    TooSmall,
    /// item is too heavy for this pocket
    TooHeavy,
    /// pocket is holding too much weight already
    Overloaded,
    /// item is too big for this pocket
    TooBig,
    /// not enough space
    NoSpace,
    /// no pocket of the requested kind exists
    NotAContainer,
}

impl core::error::Error for ContainError {}

impl ContainError {
    /// Whether this failure is purely about capacity (as opposed to the item
    /// being categorically wrong for the pocket). Overflow resolution treats
    /// the two differently.
    pub fn is_capacity_only(self) -> bool {
        matches!(self, ContainError::NoSpace | ContainError::Overloaded)
    }
}

/// A failed insertion. Hands the item back so ownership is never lost.
#[derive(Debug)]
pub struct InsertError {
    /// The item that was not inserted.
    pub item: Item,
    /// Why it was not inserted.
    pub error: ContainError,
}

impl core::fmt::Display for InsertError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cannot insert {:?}: {}", self.item.id(), self.error)
    }
}

impl core::error::Error for InsertError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// One live container slot: a shared [`PocketDefinition`] plus an ordered list
/// of contained items.
///
/// Insertion order is preserved and observable. The capacity invariant
/// (contents within the definition's volume and weight bounds) holds after
/// every successful [`insert`](Self::insert), but can be violated transiently
/// by [`force_insert`](Self::force_insert) or by rebinding to a smaller
/// definition; [`overflow`](Self::overflow) restores it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pocket {
    definition: Arc<PocketDefinition>,
    contents: Vec<Item>,
}

impl Pocket {
    /// Constructs an empty pocket bound to the given definition.
    pub fn new(definition: Arc<PocketDefinition>) -> Self {
        Pocket {
            definition,
            contents: Vec::new(),
        }
    }

    /// Constructs the synthetic legacy bridge pocket.
    pub fn legacy() -> Self {
        Self::new(Arc::new(PocketDefinition::legacy()))
    }

    /// The rules this pocket enforces.
    pub fn definition(&self) -> &PocketDefinition {
        &self.definition
    }

    /// Rebinds this pocket to a different definition, keeping contents.
    ///
    /// This may leave the capacity invariant violated; the caller is expected
    /// to follow up with [`overflow`](Self::overflow).
    pub fn redefine(&mut self, definition: Arc<PocketDefinition>) {
        self.definition = definition;
    }

    /// This pocket's kind.
    pub fn kind(&self) -> PocketKind {
        self.definition.kind
    }

    /// Whether this pocket is of the given kind.
    pub fn is(&self, kind: PocketKind) -> bool {
        self.definition.kind == kind
    }

    /// Whether the pocket holds nothing.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Number of directly contained items (stacks, not charges).
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// The contained items, in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.contents
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.contents
    }

    /// Combined volume of contents, including their own nested contents.
    pub fn contains_volume(&self) -> Volume {
        self.contents.iter().map(Item::full_volume).sum()
    }

    /// Combined weight of contents, including their own nested contents.
    pub fn contains_weight(&self) -> Mass {
        self.contents.iter().map(Item::full_weight).sum()
    }

    /// The definition's volume capacity.
    pub fn volume_capacity(&self) -> Volume {
        self.definition.max_volume
    }

    /// Volume still free. Negative while an overflow violation is pending.
    pub fn remaining_volume(&self) -> Volume {
        self.definition.max_volume - self.contains_volume()
    }

    /// Weight still supportable. Negative while an overflow violation is pending.
    pub fn remaining_weight(&self) -> Mass {
        self.definition.max_weight - self.contains_weight()
    }

    /// How much this pocket adds to its owner's displayed size: nothing if
    /// rigid, otherwise the bulk of the contents.
    pub fn item_size_modifier(&self) -> Volume {
        if self.definition.rigid {
            Volume::ZERO
        } else {
            self.contains_volume()
        }
    }

    /// How much this pocket adds to its owner's weight, after the pocket's
    /// weight multiplier.
    pub fn item_weight_modifier(&self) -> Mass {
        self.contains_weight().scale(self.definition.weight_multiplier)
    }

    /// Whether some contained item can stack with `item`.
    pub fn has_item_stacks_with(&self, item: &Item) -> bool {
        self.contents.iter().any(|inside| item.stacks_with(inside))
    }

    /// Tests whether this pocket could accept `item`, without mutating
    /// anything.
    ///
    /// The checks run in a fixed priority order; the first failure wins.
    pub fn can_contain(&self, item: &Item) -> Result<(), ContainError> {
        let def = &*self.definition;
        // Legacy pockets are filled only through the explicit legacy path.
        if def.kind == PocketKind::Legacy {
            return Err(ContainError::LegacyOnly);
        }
        // A pocket whose first occupant is a liquid (or gas) is a liquid
        // (gas) pocket, no matter how many stacks of it have accumulated or
        // what a forced insertion has piled on top; nothing that cannot
        // stack with the occupant may join.
        if item.made_of(Phase::Liquid) {
            if !def.watertight {
                return Err(ContainError::LiquidMismatch);
            }
            if !self.contents.is_empty() && !self.has_item_stacks_with(item) {
                return Err(ContainError::LiquidMismatch);
            }
        } else if self.contents.first().is_some_and(|c| c.made_of(Phase::Liquid)) {
            return Err(ContainError::LiquidMismatch);
        }
        if item.made_of(Phase::Gas) {
            if !def.gastight {
                return Err(ContainError::GasMismatch);
            }
            if !self.contents.is_empty() && !self.has_item_stacks_with(item) {
                return Err(ContainError::GasMismatch);
            }
        } else if self.contents.first().is_some_and(|c| c.made_of(Phase::Gas)) {
            return Err(ContainError::GasMismatch);
        }
        if !def.flag_restriction.is_empty() && !item.has_any_tag(&def.flag_restriction) {
            return Err(ContainError::FlagMismatch);
        }
        // An ammo restriction makes the pocket accept matching ammo and
        // nothing else, in place of volume/weight accounting.
        if !def.ammo_restriction.is_empty() {
            return match item.ammo() {
                Some(ammo) if item.is_ammo() && def.ammo_restriction.contains(ammo) => Ok(()),
                _ => Err(ContainError::AmmoMismatch),
            };
        }
        if item.full_volume() < def.min_item_volume {
            return Err(ContainError::TooSmall);
        }
        if item.full_weight() > def.max_weight {
            return Err(ContainError::TooHeavy);
        }
        if item.full_weight() > self.remaining_weight() {
            return Err(ContainError::Overloaded);
        }
        if item.full_volume() > def.max_volume {
            return Err(ContainError::TooBig);
        }
        if item.full_volume() > self.remaining_volume() {
            return Err(ContainError::NoSpace);
        }
        Ok(())
    }

    /// Inserts `item`, re-running the containment test first. On failure the
    /// pocket is unchanged and the item is handed back.
    pub fn insert(&mut self, item: Item) -> Result<(), InsertError> {
        match self.can_contain(&item) {
            Ok(()) => {
                self.contents.push(item);
                Ok(())
            }
            Err(error) => Err(InsertError { item, error }),
        }
    }

    /// Appends `item` without any containment test.
    ///
    /// Reserved for trusted callers (legacy migration, debug tooling). May
    /// violate the capacity invariant; follow up with
    /// [`overflow`](Self::overflow) once bulk loading is done.
    pub fn force_insert(&mut self, item: Item) {
        self.contents.push(item);
    }

    /// Removes and returns the item at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Item> {
        if index < self.contents.len() {
            Some(self.contents.remove(index))
        } else {
            None
        }
    }

    /// Removes every item matching `filter`, returning them in order.
    pub fn remove_items_if(&mut self, mut filter: impl FnMut(&Item) -> bool) -> Vec<Item> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.contents.len() {
            if filter(&self.contents[i]) {
                removed.push(self.contents.remove(i));
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Recursive filtered extraction: moves items matching `filter` into
    /// `removed`, descending into contained items that do not match,
    /// decrementing `count` per extraction. Returns true once `count` hits
    /// zero and no further visiting is required.
    pub fn remove_internal(
        &mut self,
        filter: &mut dyn FnMut(&Item) -> bool,
        count: &mut u32,
        removed: &mut Vec<Item>,
    ) -> bool {
        if *count == 0 {
            return true;
        }
        let mut i = 0;
        while i < self.contents.len() {
            if filter(&self.contents[i]) {
                removed.push(self.contents.remove(i));
                *count -= 1;
                if *count == 0 {
                    return true;
                }
            } else {
                if self.contents[i]
                    .contents_mut()
                    .remove_internal(filter, count, removed)
                {
                    return true;
                }
                i += 1;
            }
        }
        false
    }

    /// Returns the first contained item matching `filter`.
    pub fn get_item_with(&self, mut filter: impl FnMut(&Item) -> bool) -> Option<&Item> {
        self.contents.iter().find(|it| filter(it))
    }

    /// Empties the pocket into `sink`.
    pub fn spill(&mut self, sink: &mut dyn DropSink) {
        for item in self.contents.drain(..) {
            sink.deposit(item);
        }
    }

    /// Drops all contents on the floor of the data model. Prefer
    /// [`spill`](Self::spill) when the items should survive.
    pub fn clear(&mut self) {
        self.contents.clear();
    }

    /// Restores the capacity invariant after it has been violated (definition
    /// shrank, forced insertion), evicting items into `sink`.
    ///
    /// Items that now fail containment for a reason other than pure capacity
    /// are ejected unconditionally first. Then the largest-by-volume item is
    /// evicted until volume fits, then the heaviest until weight fits.
    /// Legacy pockets have no constraints and never overflow.
    pub fn overflow(&mut self, sink: &mut dyn DropSink) {
        if self.is(PocketKind::Legacy) || self.contents.is_empty() {
            return;
        }
        let mut i = 0;
        while i < self.contents.len() {
            let verdict = self.can_contain(&self.contents[i]);
            match verdict {
                Err(e) if !e.is_capacity_only() => {
                    sink.deposit(self.contents.remove(i));
                }
                _ => i += 1,
            }
        }
        while self.remaining_volume().is_negative() && !self.contents.is_empty() {
            let biggest = max_index_by_key(&self.contents, Item::full_volume);
            sink.deposit(self.contents.remove(biggest));
        }
        while self.remaining_weight().is_negative() && !self.contents.is_empty() {
            let heaviest = max_index_by_key(&self.contents, Item::full_weight);
            sink.deposit(self.contents.remove(heaviest));
        }
    }

    /// Tie-break relation for the best-pocket search: whether this pocket is
    /// a better home for `item` than `other`.
    ///
    /// Criteria, each decisive the moment it discriminates:
    /// an existing compatible stack; an ammo restriction; a flag restriction;
    /// (for spoilable items, terminally) a lower spoil multiplier; rigidity;
    /// (for solids) watertightness; least remaining volume, then lower
    /// extraction cost. This order is load-bearing for save compatibility —
    /// do not reorder.
    pub fn is_better_than(&self, other: &Pocket, item: &Item) -> bool {
        let self_stacks = self.has_item_stacks_with(item);
        if self_stacks != other.has_item_stacks_with(item) {
            return self_stacks;
        }
        let self_ammo = !self.definition.ammo_restriction.is_empty();
        if self_ammo != !other.definition.ammo_restriction.is_empty() {
            // ammo slots are precious; fill them first
            return self_ammo;
        }
        let self_flag = !self.definition.flag_restriction.is_empty();
        if self_flag != !other.definition.flag_restriction.is_empty() {
            return self_flag;
        }
        if item.spoils() {
            // terminal on purpose, even when equal
            return self.definition.spoil_multiplier < other.definition.spoil_multiplier;
        }
        if self.definition.rigid != other.definition.rigid {
            return self.definition.rigid;
        }
        if item.made_of(Phase::Solid)
            && self.definition.watertight != other.definition.watertight
        {
            return self.definition.watertight;
        }
        if self.remaining_volume() == other.remaining_volume() {
            return self.definition.extraction_cost < other.definition.extraction_cost;
        }
        // pack tightly: the least remaining volume wins
        self.remaining_volume() < other.remaining_volume()
    }

    /// Whether two pockets hold positionally equal, stack-compatible
    /// contents (used to decide whether two otherwise-identical parent items
    /// can merge into one inventory stack).
    pub fn stacks_with(&self, other: &Pocket) -> bool {
        self.contents.len() == other.contents.len()
            && self
                .contents
                .iter()
                .zip(&other.contents)
                .all(|(a, b)| a.charges() == b.charges() && a.stacks_with(b))
    }

    /// Stricter content-identity comparison: pairwise type id plus charges.
    pub fn same_contents(&self, other: &Pocket) -> bool {
        self.contents.len() == other.contents.len()
            && self
                .contents
                .iter()
                .zip(&other.contents)
                .all(|(a, b)| a.same_content_as(b))
    }

    /// Time cost to take `item` (identified by reference) out of this
    /// pocket, or 0 when it is not here.
    pub fn obtain_cost(&self, item: &Item) -> u32 {
        if self.contents.iter().any(|it| core::ptr::eq(it, item)) {
            self.definition.extraction_cost
        } else {
            0
        }
    }

    /// The first contained magazine, if any.
    pub fn magazine_current(&self) -> Option<&Item> {
        self.contents.iter().find(|it| it.is_magazine())
    }

    /// Consumes up to `qty` charges of contained ammunition, removing drained
    /// stacks. Returns the quantity still wanted.
    pub fn ammo_consume(&mut self, mut qty: u32) -> u32 {
        let mut i = 0;
        while i < self.contents.len() && qty > 0 {
            if self.contents[i].is_ammo() {
                qty -= self.contents[i].consume_charges(qty);
                if self.contents[i].charges() == 0 {
                    self.contents.remove(i);
                    continue;
                }
            }
            i += 1;
        }
        qty
    }

    /// Offers each spent casing to `func`. A casing handed back is kept (with
    /// its casing tag restored for the next call); `None` means `func` took it.
    pub fn casings_handle(&mut self, func: &mut dyn FnMut(Item) -> Option<Item>) {
        let mut kept = Vec::with_capacity(self.contents.len());
        for mut item in self.contents.drain(..) {
            if item.tags().contains(&tag::CASING) {
                item.tags.remove(&tag::CASING);
                match func(item) {
                    None => continue,
                    Some(mut returned) => {
                        returned.tags.insert(tag::CASING.clone());
                        kept.push(returned);
                    }
                }
            } else {
                kept.push(item);
            }
        }
        self.contents = kept;
    }

    /// Whether a fire reaching the parent item would set off anything inside.
    pub fn will_explode_in_fire(&self) -> bool {
        if self.definition.fire_protection {
            return false;
        }
        self.contents.iter().any(Item::will_explode_in_fire)
    }

    /// Detonates any explosive contents, collecting their debris into
    /// `drops`. Returns whether anything went off (in which case the parent
    /// container is done for too).
    pub fn detonate(&mut self, drops: &mut Vec<Item>) -> bool {
        let before = self.contents.len();
        self.contents.retain_mut(|it| !it.detonate(drops));
        self.contents.len() != before
    }

    /// Advances spoilage of contents by `amount` (a fraction of shelf life),
    /// scaled by this pocket's spoil multiplier and compounded through nested
    /// pockets. Fully rotted items are destroyed.
    pub fn process_rot(&mut self, amount: NotNan<f32>) {
        let scaled = amount * self.definition.spoil_multiplier;
        self.contents.retain_mut(|it| {
            it.contents_mut().process_rot(scaled);
            !it.tick_rot(scaled)
        });
    }

    /// Consumes whole items of type `id`, recursing into contents first,
    /// until `quantity` is satisfied. Consumed items move into `used`.
    /// Returns whether anything was consumed from this pocket tree.
    pub fn use_amount(&mut self, id: &ItemId, quantity: &mut u32, used: &mut Vec<Item>) -> bool {
        let mut any = false;
        let mut i = 0;
        while i < self.contents.len() && *quantity > 0 {
            any |= self.contents[i].contents_mut().use_amount(id, quantity, used);
            if *quantity > 0 && self.contents[i].id() == id {
                *quantity -= 1;
                used.push(self.contents.remove(i));
                any = true;
                continue;
            }
            i += 1;
        }
        any
    }

    /// Strips everything out of this pocket to `carrier`, charging extraction
    /// time per item. Used for unloading magazines.
    pub fn remove_all_ammo(&mut self, carrier: &mut dyn Carrier) {
        for item in self.contents.drain(..) {
            carrier.charge_time(self.definition.extraction_cost);
            carrier.acquire(item);
        }
    }

    /// Strips tool and gun modifications out of this pocket to `carrier`.
    pub fn remove_all_mods(&mut self, carrier: &mut dyn Carrier) {
        let mut i = 0;
        while i < self.contents.len() {
            if self.contents[i].is_mod() {
                carrier.charge_time(self.definition.extraction_cost);
                carrier.acquire(self.contents.remove(i));
            } else {
                i += 1;
            }
        }
    }
}

/// Index of the maximum element by `key`. For equal keys the earliest wins,
/// keeping eviction order deterministic.
fn max_index_by_key<K: Ord>(items: &[Item], key: impl Fn(&Item) -> K) -> usize {
    let mut best = 0;
    for (i, item) in items.iter().enumerate().skip(1) {
        if key(item) > key(&items[best]) {
            best = i;
        }
    }
    best
}
