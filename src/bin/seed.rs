use pos_orders_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
};
use uuid::Uuid;

// (nombre, categoria, precio, es_bowl)
const MENU: [(&str, &str, i64, bool); 8] = [
    ("Poke bowl", "bowls", 22000, true),
    ("Bowl vegetariano", "bowls", 19000, true),
    ("Wrap de pollo", "wraps", 16000, false),
    ("Wrap de falafel", "wraps", 15000, false),
    ("Limonada de coco", "bebidas", 7500, false),
    ("Jugo natural", "bebidas", 6000, false),
    ("Brownie", "postres", 5500, false),
    ("Almuerzo ejecutivo", "almuerzos", 13333, false),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    run_migrations(&pool).await?;

    let inserted = seed_menu(&pool).await?;
    println!("Seed completed. {inserted} new menu items");
    Ok(())
}

async fn seed_menu(pool: &DbPool) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for (nombre, categoria, precio, es_bowl) in MENU {
        let result = sqlx::query(
            r#"
            INSERT INTO menu_items (id, nombre, categoria, precio, es_bowl)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (nombre) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(nombre)
        .bind(categoria)
        .bind(precio)
        .bind(es_bowl)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}
