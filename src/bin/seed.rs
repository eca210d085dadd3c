//! Seed the database with initial users and a sample catalog.
//!
//! Idempotent: existing usernames are left alone and books are only
//! inserted into an empty catalog.

use sqlx::postgres::PgPoolOptions;

use biblin_server::{
    config::AppConfig,
    repository::Repository,
    services::users::UsersService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let users = UsersService::new(Repository::new(pool.clone()), config.auth.clone());

    let accounts = [
        ("admin", "adminpass", "admin"),
        ("user01", "password", "user"),
        ("user02", "password", "user"),
    ];

    for (username, password, role) in accounts {
        let hash = users.hash_password(password)?;
        sqlx::query(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(hash)
        .bind(role)
        .execute(&pool)
        .await?;
    }

    let book_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&pool)
        .await?;

    if book_count == 0 {
        let books = [
            ("Python Primer", "978-4-0000-0001-1", "Guido", "OReilly", 5),
            ("Flask Web Development", "978-4-0000-0002-8", "Miguel", "OReilly", 3),
            ("SQL Antipatterns", "978-4-0000-0003-5", "Bill", "OReilly", 2),
            ("The Art of Readable Code", "978-4-0000-0004-2", "Boswell", "OReilly", 0),
            ("The Mythical Man-Month", "978-4-0000-0005-9", "Brooks", "Pearson", 1),
            ("The Pragmatic Programmer", "978-4-0000-0006-6", "Andrew", "Ohmsha", 2),
            ("Clean Code", "978-4-0000-0007-3", "Martin", "Pearson", 2),
            ("Test-Driven Development", "978-4-0000-0008-0", "Kent", "Ohmsha", 2),
        ];

        for (title, isbn, author, publisher, stock) in books {
            sqlx::query(
                "INSERT INTO books (title, isbn, author, publisher, stock_count) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(title)
            .bind(isbn)
            .bind(author)
            .bind(publisher)
            .bind(stock)
            .execute(&pool)
            .await?;
        }
    }

    println!("Seeded database with initial data.");
    Ok(())
}
