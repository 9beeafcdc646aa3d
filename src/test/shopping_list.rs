#[cfg(test)]
mod tests {
    use crate::db::{Membership, add_membership, compute_shopping_list};
    use crate::models::{ShoppingListLine, render_shopping_list};
    use crate::test::utils::TestDbBuilder;

    fn line(name: &str, unit: &str, total: i64) -> ShoppingListLine {
        ShoppingListLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: total,
        }
    }

    #[rocket::async_test]
    async fn test_amounts_are_summed_across_cart() {
        let test_db = TestDbBuilder::new()
            .user("cook")
            .user("shopper")
            .tag("Baking", "baking")
            .ingredient("sugar", "g")
            .ingredient("flour", "g")
            .ingredient("salt", "g")
            .recipe("Cake", "cook", &["baking"], &[("flour", 200), ("sugar", 50)])
            .recipe("Loaf", "cook", &["baking"], &[("flour", 100)])
            .recipe("Crackers", "cook", &["baking"], &[("salt", 5)])
            .build()
            .await
            .unwrap();

        let shopper = test_db.user_id("shopper");

        // Insertion order should not matter.
        for name in ["Loaf", "Cake"] {
            add_membership(
                &test_db.pool,
                Membership::ShoppingCart,
                shopper,
                test_db.recipe_id(name),
            )
            .await
            .unwrap();
        }

        let lines = compute_shopping_list(&test_db.pool, shopper).await.unwrap();
        assert_eq!(lines, vec![line("flour", "g", 300), line("sugar", "g", 50)]);

        assert_eq!(
            render_shopping_list(&lines),
            "flour (g) — 300\nsugar (g) — 50\n"
        );

        let cook = test_db.user_id("cook");
        assert!(
            compute_shopping_list(&test_db.pool, cook)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_line_rendering() {
        assert_eq!(line("молоко", "мл", 750).render(), "молоко (мл) — 750");
        assert_eq!(render_shopping_list(&[]), "");
    }
}
