//! Print (and optionally store) the generated shopping list of a meal plan
//! Usage: cargo run --bin regenerate_shopping_list -- <meal_plan_id> [--write]

use mealplan::db::{default_database_path, migrations, Database};
use mealplan::models::{DisplayMode, ShoppingList};
use mealplan::quantity::to_fraction;
use mealplan::shopping::PlanSnapshot;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let write = args.iter().any(|a| a == "--write");
    let meal_plan_id: i64 = match args.iter().find(|a| !a.starts_with("--")) {
        Some(id) => id.parse()?,
        None => {
            eprintln!("Usage: regenerate_shopping_list <meal_plan_id> [--write]");
            std::process::exit(2);
        }
    };

    let db_path = default_database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn(migrations::run_migrations)?;

    database.with_conn_mut(|conn| {
        let Some(snapshot) = PlanSnapshot::load(conn, meal_plan_id)? else {
            println!("Meal plan {} not found", meal_plan_id);
            return Ok(());
        };

        let items = snapshot.generate();
        println!(
            "Meal plan {}: {} assignment(s), {} item(s)",
            meal_plan_id,
            snapshot.assignments.len(),
            items.len()
        );
        for item in &items {
            println!(
                "  {:>3}. {} {} {}",
                item.sort_order,
                to_fraction(item.quantity),
                item.unit,
                item.ingredient_name
            );
        }

        if !write {
            println!("\nDry run; pass --write to store these items.");
            return Ok(());
        }

        match ShoppingList::get_for_plan(conn, meal_plan_id)? {
            Some(list) => {
                let written = ShoppingList::regenerate(conn, list.id)?.unwrap_or(0);
                println!("\nReplaced items of shopping list {} ({} written)", list.id, written);
            }
            None => {
                let list = ShoppingList::create_for_plan(conn, meal_plan_id, DisplayMode::default())?;
                println!("\nCreated shopping list {}", list.id);
            }
        }
        Ok(())
    })?;

    Ok(())
}
