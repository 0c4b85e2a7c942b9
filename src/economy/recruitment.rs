//! Recruitment allocator: turns a recruit cap and a budget into unit counts
//!
//! The free unit kind is capped at its ideal share so it never crowds out
//! paid units. Paid kinds get proportional targets first; capacity one
//! resource cannot pay for is then redistributed over the kinds that are
//! still affordable. When no paid kind is affordable at all, the free kind
//! fills the whole cap.

use serde::{Deserialize, Serialize};

use crate::economy::budget::{largest_remainder, BudgetComposition};
use crate::economy::units::{ideal_composition, merge_units, total_units, UnitCounts, UnitKind};
use crate::map::{CastleTier, Region};
use crate::turn::army::Army;

/// Units produced by one recruitment call and what they cost
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitmentPlan {
    pub units: UnitCounts,
    pub spent: BudgetComposition,
    pub remaining: BudgetComposition,
}

impl RecruitmentPlan {
    pub fn total(&self) -> u32 {
        total_units(&self.units)
    }

    pub fn count(&self, kind: UnitKind) -> u32 {
        self.units.get(&kind).copied().unwrap_or(0)
    }

    /// Add the recruits to `army`, draining the region's pool and the army's budget
    pub fn apply(&self, army: &mut Army, region: &mut Region) {
        let recruited = self.total();
        merge_units(&mut army.units, &self.units);
        region.recruit_pool = region.recruit_pool.saturating_sub(recruited);
        army.recruit_cap = army.recruit_cap.saturating_sub(recruited);
        if let Some(budget) = army.budget.as_mut() {
            *budget = budget.saturating_sub(&self.spent);
        }
    }
}

/// Recruit up to `cap` units following `composition` (percent shares)
pub fn recruit(
    composition: &[(UnitKind, u32)],
    cap: u32,
    budget: BudgetComposition,
) -> RecruitmentPlan {
    let mut units = UnitCounts::new();
    let share_total: u64 = composition.iter().map(|(_, s)| u64::from(*s)).sum();

    if cap == 0 {
        return RecruitmentPlan {
            units,
            spent: BudgetComposition::zero(),
            remaining: budget,
        };
    }

    let any_affordable = composition
        .iter()
        .any(|(kind, share)| *share > 0 && !kind.is_free() && budget.can_afford(&kind.stats().cost));
    if share_total == 0 || !any_affordable {
        units.insert(UnitKind::FREE, cap);
        return RecruitmentPlan {
            units,
            spent: BudgetComposition::zero(),
            remaining: budget,
        };
    }

    let free_share: u64 = composition
        .iter()
        .filter(|(kind, _)| kind.is_free())
        .map(|(_, s)| u64::from(*s))
        .sum();
    let free = (u64::from(cap) * free_share / share_total) as u32;
    if free > 0 {
        units.insert(UnitKind::FREE, free);
    }

    let paid: Vec<(UnitKind, u32)> = composition
        .iter()
        .copied()
        .filter(|(kind, share)| !kind.is_free() && *share > 0)
        .collect();
    let paid_capacity = cap - free;

    let weights: Vec<f64> = paid.iter().map(|(_, s)| f64::from(*s)).collect();
    let targets = largest_remainder(paid_capacity, &weights);

    let mut remaining = budget;
    let mut filled = 0u32;
    for ((kind, _), target) in paid.iter().zip(targets) {
        let cost = kind.stats().cost;
        let count = target.min(remaining.max_affordable(&cost));
        if count > 0 {
            remaining = remaining.saturating_sub(&cost.scaled(count));
            *units.entry(*kind).or_insert(0) += count;
            filled += count;
        }
    }

    // Shortfall goes round-robin to whatever is still affordable
    let cycle = interleave(&paid);
    while filled < paid_capacity {
        let mut progressed = false;
        for kind in &cycle {
            if filled == paid_capacity {
                break;
            }
            let cost = kind.stats().cost;
            if let Some(rest) = remaining.checked_sub(&cost) {
                remaining = rest;
                *units.entry(*kind).or_insert(0) += 1;
                filled += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    RecruitmentPlan {
        units,
        spent: budget.saturating_sub(&remaining),
        remaining,
    }
}

/// Recruit for a castle of `tier`
pub fn recruit_for_tier(tier: CastleTier, cap: u32, budget: BudgetComposition) -> RecruitmentPlan {
    recruit(ideal_composition(tier), cap, budget)
}

/// Recruit with the army's assigned budget and cap
pub fn recruit_for_army(army: &Army, tier: CastleTier) -> RecruitmentPlan {
    let budget = army.budget.unwrap_or_default();
    if army.budget.is_none() {
        return RecruitmentPlan {
            remaining: budget,
            ..RecruitmentPlan::default()
        };
    }
    recruit_for_tier(tier, army.recruit_cap, budget)
}

/// Paid kinds repeated in proportion to their (gcd-reduced) shares, interleaved
fn interleave(paid: &[(UnitKind, u32)]) -> Vec<UnitKind> {
    let divisor = paid.iter().fold(0, |acc, (_, s)| gcd(acc, *s)).max(1);
    let reduced: Vec<(UnitKind, u32)> = paid.iter().map(|(k, s)| (*k, s / divisor)).collect();
    let rounds = reduced.iter().map(|(_, s)| *s).max().unwrap_or(0);

    let mut cycle = Vec::new();
    for round in 0..rounds {
        cycle.extend(
            reduced
                .iter()
                .filter(|(_, s)| *s > round)
                .map(|(k, _)| *k),
        );
    }
    cycle
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
