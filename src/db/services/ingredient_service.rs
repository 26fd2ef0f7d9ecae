use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::db::entities::{ingredient, prelude::*};

use super::ServiceError;

/// Escapes `%`, `_` and `\` so the filter input matches literally inside
/// a LIKE pattern.
fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Lists the ingredient catalog, optionally narrowed by a case-insensitive
/// substring of the name.
pub async fn list_ingredients(
    db: &DatabaseConnection,
    name_filter: Option<&str>,
) -> Result<Vec<ingredient::Model>, ServiceError> {
    let mut query = Ingredient::find().order_by_asc(ingredient::Column::Name);
    if let Some(name) = name_filter {
        query = query.filter(
            Expr::col((ingredient::Entity, ingredient::Column::Name))
                .ilike(format!("%{}%", escape_like_pattern(name))),
        );
    }
    Ok(query.all(db).await?)
}

pub async fn get_ingredient(
    db: &DatabaseConnection,
    id: i32,
) -> Result<ingredient::Model, ServiceError> {
    Ingredient::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Ingredient {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
        assert_eq!(escape_like_pattern("sea_salt"), "sea\\_salt");
        assert_eq!(escape_like_pattern("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like_pattern("мука"), "мука");
    }
}
