use order_core::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    seed_products(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Prices in cents.
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 4999_i64, 50, true),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1299, 100, true),
        ("Rust Sticker Pack", "Decorate your laptop", 499, 200, true),
        ("E-book: Async Rust", "Learn async Rust patterns", 2500, 75, true),
        ("Retired Tee", "No longer sold", 1999, 5, false),
    ];

    for (name, desc, price, stock, is_active) in products {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price, stock, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;

        match row {
            Some((id,)) => println!("Seeded product {name} ({id})"),
            None => println!("Product {name} already present"),
        }
    }

    Ok(())
}
