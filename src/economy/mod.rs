//! Economy: unit catalogue, budget allocation, recruitment, resource needs
//!
//! Everything here is a pure function of its inputs.

pub mod budget;
pub mod needs;
pub mod recruitment;
pub mod units;

pub use budget::{
    allocate_recruitment_budgets, apply_recruitment_budgets, largest_remainder, split,
    BudgetComposition, RecruitmentBudget,
};
pub use needs::{estimate_needs, PlayerEconomy, ResourceNeed, ResourceNeeds};
pub use recruitment::{recruit, recruit_for_army, recruit_for_tier, RecruitmentPlan};
pub use units::{ideal_composition, UnitCounts, UnitKind, UnitStats};
