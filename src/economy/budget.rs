//! Budget allocation by the largest-remainder method
//!
//! Every split conserves each resource component exactly: the recipients'
//! allocations always sum to the input total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use crate::core::types::{ArmyId, PlayerId, RegionId, ResourceKind};
use crate::map::RegionMap;
use crate::turn::army::Army;

/// Non-negative quantities of the three tradeable resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetComposition {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub wood: u32,
    #[serde(default)]
    pub iron: u32,
}

impl BudgetComposition {
    pub const fn new(gold: u32, wood: u32, iron: u32) -> Self {
        Self { gold, wood, iron }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Tradeable part of a stockpile
    pub fn from_stock(stock: &BTreeMap<ResourceKind, u32>) -> Self {
        let get = |k| stock.get(&k).copied().unwrap_or(0);
        Self::new(
            get(ResourceKind::Gold),
            get(ResourceKind::Wood),
            get(ResourceKind::Iron),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.components() == [0, 0, 0]
    }

    /// Quantity of one resource kind (food is never part of a budget)
    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Wood => self.wood,
            ResourceKind::Iron => self.iron,
            ResourceKind::Food => 0,
        }
    }

    /// Components in `ResourceKind::TRADEABLE` order
    pub fn components(&self) -> [u32; 3] {
        [self.gold, self.wood, self.iron]
    }

    pub fn from_components([gold, wood, iron]: [u32; 3]) -> Self {
        Self::new(gold, wood, iron)
    }

    /// `self - other` per component, or `None` if any component would go negative
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        Some(Self::new(
            self.gold.checked_sub(other.gold)?,
            self.wood.checked_sub(other.wood)?,
            self.iron.checked_sub(other.iron)?,
        ))
    }

    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self::new(
            self.gold.saturating_sub(other.gold),
            self.wood.saturating_sub(other.wood),
            self.iron.saturating_sub(other.iron),
        )
    }

    /// `self * n`, saturating
    pub fn scaled(&self, n: u32) -> Self {
        Self::new(
            self.gold.saturating_mul(n),
            self.wood.saturating_mul(n),
            self.iron.saturating_mul(n),
        )
    }

    /// How many units costing `unit_cost` this budget pays for
    ///
    /// `u32::MAX` for a free unit.
    pub fn max_affordable(&self, unit_cost: &Self) -> u32 {
        self.components()
            .into_iter()
            .zip(unit_cost.components())
            .filter(|(_, cost)| *cost > 0)
            .map(|(have, cost)| have / cost)
            .min()
            .unwrap_or(u32::MAX)
    }

    pub fn can_afford(&self, cost: &Self) -> bool {
        self.checked_sub(cost).is_some()
    }
}

impl Add for BudgetComposition {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.gold.saturating_add(rhs.gold),
            self.wood.saturating_add(rhs.wood),
            self.iron.saturating_add(rhs.iron),
        )
    }
}

impl AddAssign for BudgetComposition {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for BudgetComposition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, b| acc + b)
    }
}

/// Split `total` proportionally to `weights` with exact conservation
///
/// Negative and non-finite weights count as 0; if every weight is 0 the
/// split is equal. Leftover units go one at a time to the largest
/// fractional remainders, ties to the earlier index.
pub fn largest_remainder(total: u32, weights: &[f64]) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }

    let mut clean: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();
    let max = clean.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        // Rescale so the sum cannot overflow
        clean.iter_mut().for_each(|w| *w /= max);
    } else {
        clean.iter_mut().for_each(|w| *w = 1.0);
    }
    let weight_sum: f64 = clean.iter().sum();

    let mut allocation = Vec::with_capacity(clean.len());
    let mut remainders = Vec::with_capacity(clean.len());
    for &w in &clean {
        let share = f64::from(total) * (w / weight_sum);
        let floor = share.floor().clamp(0.0, f64::from(total));
        allocation.push(floor as u32);
        remainders.push(share - floor);
    }

    let mut assigned: u64 = allocation.iter().map(|&a| u64::from(a)).sum();

    // Float rounding can overshoot by a unit; take it back from the smallest remainders
    while assigned > u64::from(total) {
        let victim = (0..allocation.len())
            .filter(|&i| allocation[i] > 0)
            .min_by(|&a, &b| {
                remainders[a]
                    .total_cmp(&remainders[b])
                    .then(b.cmp(&a))
            });
        let Some(i) = victim else { break };
        allocation[i] -= 1;
        assigned -= 1;
    }

    let mut order: Vec<usize> = (0..allocation.len()).collect();
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]).then(a.cmp(&b)));

    let mut leftover = u64::from(total) - assigned;
    while leftover > 0 {
        for &i in &order {
            if leftover == 0 {
                break;
            }
            allocation[i] += 1;
            leftover -= 1;
        }
    }

    allocation
}

/// Split every component of `total` across recipients in key order
pub fn split<K: Ord + Clone>(
    total: BudgetComposition,
    weights: &BTreeMap<K, f64>,
) -> BTreeMap<K, BudgetComposition> {
    let w: Vec<f64> = weights.values().copied().collect();
    let per_component: Vec<Vec<u32>> = total
        .components()
        .into_iter()
        .map(|component| largest_remainder(component, &w))
        .collect();

    weights
        .keys()
        .enumerate()
        .map(|(i, key)| {
            let parts = [
                per_component[0][i],
                per_component[1][i],
                per_component[2][i],
            ];
            (key.clone(), BudgetComposition::from_components(parts))
        })
        .collect()
}

/// One army's share of a recruitment cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitmentBudget {
    pub resources: BudgetComposition,
    pub recruit_cap: u32,
}

/// Distribute recruit caps and resources among `player`'s armies at castles
///
/// Armies are grouped by the castle region they stand on (which `player` must
/// own). Each group splits its region's recruit pool equally. Resources are
/// split once across all participating armies, weighted by recruit cap.
/// Armies elsewhere get nothing.
pub fn allocate_recruitment_budgets<'a, M: RegionMap + ?Sized>(
    map: &M,
    armies: impl IntoIterator<Item = &'a Army>,
    player: PlayerId,
    total: BudgetComposition,
) -> BTreeMap<ArmyId, RecruitmentBudget> {
    let mut groups: BTreeMap<RegionId, Vec<ArmyId>> = BTreeMap::new();
    for army in armies.into_iter().filter(|a| a.owner == player) {
        let at_castle = map
            .region(army.region)
            .is_some_and(|r| r.is_castle() && r.owner == Some(player));
        if at_castle {
            groups.entry(army.region).or_default().push(army.id);
        }
    }

    let mut caps: BTreeMap<ArmyId, u32> = BTreeMap::new();
    for (region, members) in &groups {
        let pool = map.region(*region).map(|r| r.recruit_pool).unwrap_or(0);
        let shares = largest_remainder(pool, &vec![1.0; members.len()]);
        caps.extend(members.iter().copied().zip(shares));
    }

    let weights: BTreeMap<ArmyId, f64> = caps
        .iter()
        .map(|(&id, &cap)| (id, f64::from(cap)))
        .collect();
    let resources = split(total, &weights);

    tracing::debug!(
        "Allocated budgets for {} armies at {} castles of {}",
        caps.len(),
        groups.len(),
        player
    );

    caps.into_iter()
        .map(|(id, recruit_cap)| {
            let resources = resources.get(&id).copied().unwrap_or_default();
            (id, RecruitmentBudget { resources, recruit_cap })
        })
        .collect()
}

/// Write budgets onto `player`'s armies; armies without one are cleared
pub fn apply_recruitment_budgets<'a>(
    armies: impl IntoIterator<Item = &'a mut Army>,
    player: PlayerId,
    budgets: &BTreeMap<ArmyId, RecruitmentBudget>,
) {
    for army in armies.into_iter().filter(|a| a.owner == player) {
        match budgets.get(&army.id) {
            Some(b) => {
                army.budget = Some(b.resources);
                army.recruit_cap = b.recruit_cap;
            }
            None => {
                army.budget = None;
                army.recruit_cap = 0;
            }
        }
    }
}
