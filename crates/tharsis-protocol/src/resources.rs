use serde::{Deserialize, Serialize};

/// The six standard resource kinds every player stocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Credits,
    Steel,
    Titanium,
    Plants,
    Energy,
    Heat,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Credits,
        ResourceKind::Steel,
        ResourceKind::Titanium,
        ResourceKind::Plants,
        ResourceKind::Energy,
        ResourceKind::Heat,
    ];
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Credits => "credits",
            ResourceKind::Steel => "steel",
            ResourceKind::Titanium => "titanium",
            ResourceKind::Plants => "plants",
            ResourceKind::Energy => "energy",
            ResourceKind::Heat => "heat",
        };
        f.write_str(name)
    }
}

/// Resources that accumulate on played cards instead of in player stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardResource {
    Microbe,
    Animal,
    Floater,
    Science,
}

impl std::fmt::Display for CardResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardResource::Microbe => "microbe",
            CardResource::Animal => "animal",
            CardResource::Floater => "floater",
            CardResource::Science => "science",
        };
        f.write_str(name)
    }
}

/// Card tags, counted by discounts, requirements, milestones and awards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Building,
    Space,
    Science,
    Plant,
    Microbe,
    Animal,
    Power,
    Earth,
    Jovian,
    City,
    Event,
}

/// Per-kind stock amounts. Never negative.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub steel: u32,
    #[serde(default)]
    pub titanium: u32,
    #[serde(default)]
    pub plants: u32,
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub heat: u32,
}

impl ResourceSet {
    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Credits => self.credits,
            ResourceKind::Steel => self.steel,
            ResourceKind::Titanium => self.titanium,
            ResourceKind::Plants => self.plants,
            ResourceKind::Energy => self.energy,
            ResourceKind::Heat => self.heat,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Credits => &mut self.credits,
            ResourceKind::Steel => &mut self.steel,
            ResourceKind::Titanium => &mut self.titanium,
            ResourceKind::Plants => &mut self.plants,
            ResourceKind::Energy => &mut self.energy,
            ResourceKind::Heat => &mut self.heat,
        }
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        *self.slot(kind) += amount;
    }

    pub fn has(&self, kind: ResourceKind, amount: u32) -> bool {
        self.get(kind) >= amount
    }

    /// Removes `amount` of `kind`. Returns false (and leaves the set
    /// untouched) when the stock is short.
    pub fn debit(&mut self, kind: ResourceKind, amount: u32) -> bool {
        let slot = self.slot(kind);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }
}

/// Per-kind production levels. Credits production may run negative;
/// the others floor at zero when reduced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionSet {
    #[serde(default)]
    pub credits: i32,
    #[serde(default)]
    pub steel: i32,
    #[serde(default)]
    pub titanium: i32,
    #[serde(default)]
    pub plants: i32,
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub heat: i32,
}

impl ProductionSet {
    pub fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Credits => self.credits,
            ResourceKind::Steel => self.steel,
            ResourceKind::Titanium => self.titanium,
            ResourceKind::Plants => self.plants,
            ResourceKind::Energy => self.energy,
            ResourceKind::Heat => self.heat,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut i32 {
        match kind {
            ResourceKind::Credits => &mut self.credits,
            ResourceKind::Steel => &mut self.steel,
            ResourceKind::Titanium => &mut self.titanium,
            ResourceKind::Plants => &mut self.plants,
            ResourceKind::Energy => &mut self.energy,
            ResourceKind::Heat => &mut self.heat,
        }
    }

    /// Adjusts production by `delta`. Only credits may go below zero
    /// (floor -5); every other kind floors at zero. Returns false when the
    /// adjustment would cross the floor.
    pub fn adjust(&mut self, kind: ResourceKind, delta: i32) -> bool {
        let floor = if kind == ResourceKind::Credits { -5 } else { 0 };
        let slot = self.slot(kind);
        let next = *slot + delta;
        if next < floor {
            return false;
        }
        *slot = next;
        true
    }
}

/// A spend allocation across the payable kinds. Steel and titanium are
/// only payable where the cost context accepts them; heat only for the
/// corporation that spends heat as credits; energy only as a trade
/// allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub steel: u32,
    #[serde(default)]
    pub titanium: u32,
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub heat: u32,
}

impl Payment {
    pub fn credits(amount: u32) -> Self {
        Payment {
            credits: amount,
            ..Payment::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.credits == 0
            && self.steel == 0
            && self.titanium == 0
            && self.energy == 0
            && self.heat == 0
    }

    /// Total credit value at the given metal exchange rates. Heat is
    /// always worth 1 where it is payable at all; energy has no credit
    /// value.
    pub fn value(&self, steel_value: u32, titanium_value: u32) -> u32 {
        self.credits + self.steel * steel_value + self.titanium * titanium_value + self.heat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_refuses_short_stock() {
        let mut set = ResourceSet {
            plants: 3,
            ..ResourceSet::default()
        };
        assert!(!set.debit(ResourceKind::Plants, 4));
        assert_eq!(set.plants, 3);
        assert!(set.debit(ResourceKind::Plants, 3));
        assert_eq!(set.plants, 0);
    }

    #[test]
    fn production_floors_differ_by_kind() {
        let mut prod = ProductionSet::default();
        assert!(prod.adjust(ResourceKind::Credits, -5));
        assert_eq!(prod.credits, -5);
        assert!(!prod.adjust(ResourceKind::Credits, -1));
        assert!(!prod.adjust(ResourceKind::Steel, -1));
        assert!(prod.adjust(ResourceKind::Steel, 2));
        assert!(prod.adjust(ResourceKind::Steel, -2));
        assert_eq!(prod.steel, 0);
    }

    #[test]
    fn payment_value_applies_rates() {
        let payment = Payment {
            credits: 3,
            steel: 2,
            titanium: 1,
            heat: 4,
            ..Payment::default()
        };
        assert_eq!(payment.value(2, 3), 3 + 4 + 3 + 4);
        assert_eq!(payment.value(3, 4), 3 + 6 + 4 + 4);
    }
}
