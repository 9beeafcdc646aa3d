#[cfg(test)]
mod tests {
    use crate::db::{
        get_author_with_recipes, get_profile, list_subscriptions, subscribe, unsubscribe,
    };
    use crate::error::AppError;
    use crate::test::utils::create_standard_test_db;

    #[rocket::async_test]
    async fn test_cannot_follow_self() {
        let test_db = create_standard_test_db().await;
        let alice = test_db.user_id("alice");

        let result = subscribe(&test_db.pool, alice, alice).await;
        assert!(matches!(result, Err(AppError::Conflict(ref msg)) if msg == "Cannot follow self"));

        // Still rejected once other subscriptions exist.
        subscribe(&test_db.pool, alice, test_db.user_id("bob"))
            .await
            .unwrap();
        assert!(matches!(
            subscribe(&test_db.pool, alice, alice).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(test_db.count_rows("subscriptions").await, 1);
    }

    #[rocket::async_test]
    async fn test_duplicate_subscription_conflicts() {
        let test_db = create_standard_test_db().await;
        let bob = test_db.user_id("bob");
        let alice = test_db.user_id("alice");

        subscribe(&test_db.pool, bob, alice).await.unwrap();
        let second = subscribe(&test_db.pool, bob, alice).await;
        assert!(matches!(second, Err(AppError::Conflict(ref msg)) if msg == "Already subscribed"));

        let profile = get_profile(&test_db.pool, alice, Some(bob)).await.unwrap();
        assert!(profile.is_subscribed);

        let anonymous = get_profile(&test_db.pool, alice, None).await.unwrap();
        assert!(!anonymous.is_subscribed);
    }

    #[rocket::async_test]
    async fn test_unknown_author_is_not_found() {
        let test_db = create_standard_test_db().await;

        let result = subscribe(&test_db.pool, test_db.user_id("bob"), 31337).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_unsubscribe_is_idempotent() {
        let test_db = create_standard_test_db().await;
        let bob = test_db.user_id("bob");
        let alice = test_db.user_id("alice");

        subscribe(&test_db.pool, bob, alice).await.unwrap();

        assert!(unsubscribe(&test_db.pool, bob, alice).await.unwrap());
        assert!(!unsubscribe(&test_db.pool, bob, alice).await.unwrap());
        assert_eq!(test_db.count_rows("subscriptions").await, 0);
    }

    #[rocket::async_test]
    async fn test_list_subscriptions_counts_and_caps_recipes() {
        let test_db = create_standard_test_db().await;
        let root = test_db.user_id("root");

        subscribe(&test_db.pool, root, test_db.user_id("bob"))
            .await
            .unwrap();
        subscribe(&test_db.pool, root, test_db.user_id("alice"))
            .await
            .unwrap();

        let (authors, total) = list_subscriptions(&test_db.pool, root, 10, 0, Some(1))
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(authors[0].profile.username, "alice");
        assert_eq!(authors[0].recipes_count, 2);
        assert_eq!(authors[0].recipes.len(), 1);
        assert_eq!(authors[0].recipes[0].name, "Bread");
        assert!(authors[0].profile.is_subscribed);
        assert_eq!(authors[1].profile.username, "bob");
        assert_eq!(authors[1].recipes_count, 1);

        let (page, total) = list_subscriptions(&test_db.pool, root, 1, 1, None)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].profile.username, "bob");

        let uncapped = get_author_with_recipes(&test_db.pool, test_db.user_id("alice"), None, None)
            .await
            .unwrap();
        assert_eq!(uncapped.recipes.len(), 2);
        assert!(!uncapped.profile.is_subscribed);
    }
}
