use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::{subscription, prelude::*};

use super::ServiceError;

/// Makes `user_id` follow `author_id`.
///
/// Following oneself is invalid, checked before any query. An unknown
/// author is `NotFound`, an existing pair `Duplicate`.
pub async fn subscribe(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), ServiceError> {
    if user_id == author_id {
        return Err(ServiceError::Validation(
            "Cannot subscribe to yourself".to_string(),
        ));
    }
    if User::find_by_id(author_id).one(db).await?.is_none() {
        return Err(ServiceError::NotFound(format!("User {author_id}")));
    }
    if Subscription::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(ServiceError::Duplicate(format!(
            "Subscription to user {author_id}"
        )));
    }

    subscription::ActiveModel {
        user_id: Set(user_id),
        follows_id: Set(author_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn unsubscribe(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), ServiceError> {
    let entry = Subscription::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Subscription to user {author_id}")))?;
    entry.delete(db).await?;
    Ok(())
}

/// Membership check backing the `is_subscribed` flag; anonymous → `false`
/// without querying.
pub async fn is_subscribed(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    author_id: i32,
) -> Result<bool, ServiceError> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    Ok(Subscription::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some())
}

/// The authors the user follows, ordered by username like the user listing.
pub async fn followed_authors(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<crate::db::entities::user::Model>, ServiceError> {
    let follows = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let author_ids: Vec<i32> = follows.into_iter().map(|s| s.follows_id).collect();
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }
    let authors = User::find()
        .filter(crate::db::entities::user::Column::Id.is_in(author_ids))
        .order_by_asc(crate::db::entities::user::Column::Username)
        .all(db)
        .await?;
    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn self_subscription_is_rejected_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = subscribe(&db, 5, 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn anonymous_is_subscribed_is_false() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(!is_subscribed(&db, None, 9).await.unwrap());
    }

    fn sample_author() -> crate::db::entities::user::Model {
        crate::db::entities::user::Model {
            id: 2,
            email: "chef@example.com".to_string(),
            username: "chef".to_string(),
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            avatar: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_subscription_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_author()]])
            .append_query_results([vec![subscription::Model {
                user_id: 1,
                follows_id: 2,
            }]])
            .into_connection();

        let err = subscribe(&db, 1, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
    }

    #[tokio::test]
    async fn followed_authors_are_ordered_by_username() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![subscription::Model {
                user_id: 1,
                follows_id: 2,
            }]])
            .append_query_results([vec![sample_author()]])
            .into_connection();

        let authors = followed_authors(&db, 1).await.unwrap();
        assert_eq!(authors.len(), 1);

        let log = db.into_transaction_log();
        let author_query = format!("{:?}", log[1]);
        assert!(author_query.contains("ORDER BY"));
        assert!(author_query.contains("username"));
    }
}
