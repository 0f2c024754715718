use sea_orm::{ConnectionTrait, Database, Statement};
use std::env;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let db = Database::connect(database_url).await?;
    let backend = db.get_database_backend();

    for table in ["srs", "documents", "seaql_migrations"] {
        db.execute(Statement::from_string(
            backend,
            format!("DROP TABLE IF EXISTS \"{}\";", table),
        ))
        .await?;
        println!("Dropped {}", table);
    }

    println!("Database reset successfully");
    Ok(())
}
