//! Builds the consolidated shopping list for everything in a user's cart.
//!
//! The aggregation is deliberately keyed by (ingredient name, measurement
//! unit) rather than by line id: two recipes may share one underlying
//! (ingredient, amount) row, and the sum has to count every
//! (recipe, line) occurrence on its own.

use std::collections::{BTreeMap, HashMap};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::db::entities::{ingredient, ingredient_amount, prelude::*, recipe_ingredient};

use super::ServiceError;

pub const REPORT_HEADER: &str = "Список покупок";

/// One resolved (recipe, line) occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Groups resolved lines by (name, unit) and sums the amounts. The BTreeMap
/// keeps the output ordered by name, then unit, so the report is
/// deterministic regardless of cart order.
pub fn aggregate_lines<I>(lines: I) -> BTreeMap<(String, String), i64>
where
    I: IntoIterator<Item = ResolvedLine>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += i64::from(line.amount);
    }
    totals
}

/// Renders the header plus one `{name} ({unit}) — {sum}` line per group.
/// An empty aggregate yields just the header.
pub fn render_report(totals: &BTreeMap<(String, String), i64>) -> String {
    let mut report = String::from(REPORT_HEADER);
    for ((name, unit), total) in totals {
        report.push('\n');
        report.push_str(&format!("{name} ({unit}) — {total}"));
    }
    report.push('\n');
    report
}

/// Produces the text report for the user's current cart. An empty cart is
/// not an error, the report is simply header-only.
pub async fn generate_report(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<String, ServiceError> {
    let recipe_ids = super::cart_recipe_ids(db, user_id).await?;
    debug!(user_id, recipes = recipe_ids.len(), "building shopping list");
    if recipe_ids.is_empty() {
        return Ok(render_report(&BTreeMap::new()));
    }

    // One recipe_ingredients row per (recipe, line) occurrence; shared
    // ingredient_amount rows therefore count once per referencing recipe.
    let links = RecipeIngredient::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .all(db)
        .await?;

    let amounts: HashMap<i32, ingredient_amount::Model> = IngredientAmount::find()
        .filter(ingredient_amount::Column::Id.is_in(links.iter().map(|l| l.ingredient_amount_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let ingredients: HashMap<i32, ingredient::Model> = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(amounts.values().map(|a| a.ingredient_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();

    let mut resolved = Vec::with_capacity(links.len());
    for link in &links {
        let amount = amounts.get(&link.ingredient_amount_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Ingredient line {}", link.ingredient_amount_id))
        })?;
        let ingredient = ingredients.get(&amount.ingredient_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Ingredient {}", amount.ingredient_id))
        })?;
        resolved.push(ResolvedLine {
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
            amount: amount.amount,
        });
    }

    Ok(render_report(&aggregate_lines(resolved)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i32) -> ResolvedLine {
        ResolvedLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn empty_cart_yields_header_only() {
        let report = render_report(&aggregate_lines(Vec::new()));
        assert_eq!(report, format!("{REPORT_HEADER}\n"));
    }

    #[test]
    fn amounts_are_summed_per_name_and_unit() {
        // Recipe A has Flour/g=200 and Salt/g=5,
        // recipe B has Flour/g=300 and Sugar/g=50.
        let totals = aggregate_lines(vec![
            line("Flour", "g", 200),
            line("Salt", "g", 5),
            line("Flour", "g", 300),
            line("Sugar", "g", 50),
        ]);
        assert_eq!(totals[&("Flour".to_string(), "g".to_string())], 500);
        assert_eq!(totals[&("Salt".to_string(), "g".to_string())], 5);
        assert_eq!(totals[&("Sugar".to_string(), "g".to_string())], 50);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn result_is_independent_of_occurrence_order() {
        let forward = aggregate_lines(vec![
            line("Flour", "g", 200),
            line("Sugar", "g", 50),
            line("Flour", "g", 300),
        ]);
        let reversed = aggregate_lines(vec![
            line("Flour", "g", 300),
            line("Sugar", "g", 50),
            line("Flour", "g", 200),
        ]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn identical_shared_lines_count_once_per_occurrence() {
        // Two cart recipes both reference the same 200 g flour line.
        let totals = aggregate_lines(vec![line("Flour", "g", 200), line("Flour", "g", 200)]);
        assert_eq!(totals[&("Flour".to_string(), "g".to_string())], 400);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let totals = aggregate_lines(vec![line("Milk", "ml", 200), line("Milk", "g", 100)]);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn report_lines_are_ordered_by_name() {
        let totals = aggregate_lines(vec![
            line("Sugar", "g", 50),
            line("Flour", "g", 500),
            line("Salt", "g", 5),
        ]);
        let report = render_report(&totals);
        assert_eq!(
            report,
            format!("{REPORT_HEADER}\nFlour (g) — 500\nSalt (g) — 5\nSugar (g) — 50\n")
        );
    }
}
