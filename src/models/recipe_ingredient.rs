//! Recipe ingredient lines
//!
//! Each line ties an ingredient to a recipe (and optionally one of its
//! sections) with a quantity, unit and note. The same ingredient may appear
//! on several lines.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::quantity::{parse_quantity, to_fraction};
use super::{Ingredient, RecipeSection};

const MAX_UNIT_LEN: usize = 50;
const MAX_NOTE_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub recipe_section_id: Option<i64>,
    pub quantity: f64,
    pub unit: String,
    pub note: Option<String>,
}

/// Ingredient line joined with the ingredient's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub recipe_section_id: Option<i64>,
    pub quantity: f64,
    /// Quantity as a cook would write it ("1 1/2")
    pub display_quantity: String,
    pub unit: String,
    pub note: Option<String>,
}

/// One ingredient line as entered; the ingredient is given by id or by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientLine {
    pub ingredient_id: Option<i64>,
    pub ingredient_name: Option<String>,
    pub quantity: String,
    pub unit: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionInput {
    pub name: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
}

/// Validated line, ready to insert
struct ResolvedLine {
    ingredient_id: i64,
    quantity: f64,
    unit: String,
    note: Option<String>,
}

impl RecipeIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            recipe_section_id: row.get("recipe_section_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            note: row.get("note")?,
        })
    }

    /// All lines of a recipe: unsectioned lines first, then each section in
    /// `sort_order`, lines in entry order within a group
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.* FROM recipe_ingredients ri
            LEFT JOIN recipe_sections rs ON rs.id = ri.recipe_section_id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.recipe_section_id IS NOT NULL, rs.sort_order, rs.id, ri.id
            "#,
        )?;
        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    /// Same ordering as `get_for_recipe`, with ingredient names
    pub fn get_details_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.ingredient_id, i.name AS ingredient_name, ri.recipe_section_id,
                   ri.quantity, ri.unit, ri.note
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            LEFT JOIN recipe_sections rs ON rs.id = ri.recipe_section_id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.recipe_section_id IS NOT NULL, rs.sort_order, rs.id, ri.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                let quantity: f64 = row.get("quantity")?;
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    ingredient_id: row.get("ingredient_id")?,
                    ingredient_name: row.get("ingredient_name")?,
                    recipe_section_id: row.get("recipe_section_id")?,
                    quantity,
                    display_quantity: to_fraction(quantity),
                    unit: row.get("unit")?,
                    note: row.get("note")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    pub fn count_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = ?1",
            [recipe_id],
            |row| row.get(0),
        )?)
    }
}

/// Replace every ingredient line and section of a recipe.
///
/// Takes either a flat list or a list of sections, never both. All lines
/// are validated before anything is written; run inside a transaction so a
/// storage failure leaves the old lines in place.
pub fn replace_recipe_ingredients(
    conn: &Connection,
    recipe_id: i64,
    ingredients: Option<&[IngredientLine]>,
    sections: Option<&[SectionInput]>,
) -> DbResult<usize> {
    if ingredients.is_some_and(|l| !l.is_empty()) && sections.is_some_and(|s| !s.is_empty()) {
        return Err(DbError::invalid("Provide either ingredients or sections, not both"));
    }

    let flat = ingredients
        .unwrap_or_default()
        .iter()
        .map(|line| resolve_line(conn, line))
        .collect::<DbResult<Vec<_>>>()?;

    let mut grouped = Vec::new();
    for section in sections.unwrap_or_default() {
        if section.name.trim().is_empty() {
            return Err(DbError::invalid("Section name is required"));
        }
        let lines = section
            .ingredients
            .iter()
            .map(|line| resolve_line(conn, line))
            .collect::<DbResult<Vec<_>>>()?;
        grouped.push((section, lines));
    }

    conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [recipe_id])?;
    RecipeSection::delete_for_recipe(conn, recipe_id)?;

    let mut written = 0;
    for line in &flat {
        insert_line(conn, recipe_id, None, line)?;
        written += 1;
    }
    for (position, (section, lines)) in grouped.iter().enumerate() {
        let stored = RecipeSection::create(
            conn,
            recipe_id,
            &section.name,
            position as i64,
            section.instructions.as_deref(),
        )?;
        for line in lines {
            insert_line(conn, recipe_id, Some(stored.id), line)?;
            written += 1;
        }
    }

    Ok(written)
}

fn resolve_line(conn: &Connection, line: &IngredientLine) -> DbResult<ResolvedLine> {
    let ingredient_id = match (line.ingredient_id, line.ingredient_name.as_deref()) {
        (Some(id), _) => Ingredient::get_by_id(conn, id)?
            .ok_or_else(|| DbError::invalid(format!("Ingredient {} not found", id)))?
            .id,
        (None, Some(name)) => Ingredient::find_or_create(conn, name)?.id,
        (None, None) => {
            return Err(DbError::invalid("Each ingredient line needs an ingredient_id or ingredient_name"))
        }
    };

    let quantity = parse_quantity(&line.quantity).map_err(DbError::Invalid)?;

    let unit = line.unit.trim();
    if unit.is_empty() {
        return Err(DbError::invalid("Unit is required"));
    }
    if unit.chars().count() > MAX_UNIT_LEN {
        return Err(DbError::invalid(format!("Unit may not exceed {} characters", MAX_UNIT_LEN)));
    }

    let note = line
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN) {
        return Err(DbError::invalid(format!("Note may not exceed {} characters", MAX_NOTE_LEN)));
    }

    Ok(ResolvedLine {
        ingredient_id,
        quantity,
        unit: unit.to_string(),
        note,
    })
}

fn insert_line(conn: &Connection, recipe_id: i64, section_id: Option<i64>, line: &ResolvedLine) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, recipe_section_id, quantity, unit, note)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![recipe_id, line.ingredient_id, section_id, line.quantity, line.unit, line.note],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;
    use crate::models::fixtures::{line, recipe};

    #[test]
    fn flat_lines_parse_fractions_and_create_ingredients() {
        let conn = test_connection();
        let recipe_id = recipe(&conn, "Biscuits", 2);

        let lines = vec![line("flour", "1 1/2", "cup"), line("butter", "1/4", "cup")];
        assert_eq!(replace_recipe_ingredients(&conn, recipe_id, Some(lines.as_slice()), None).unwrap(), 2);

        let details = RecipeIngredient::get_details_for_recipe(&conn, recipe_id).unwrap();
        assert_eq!(details[0].ingredient_name, "flour");
        assert_eq!(details[0].quantity, 1.5);
        assert_eq!(details[0].display_quantity, "1 1/2");
        assert_eq!(details[1].display_quantity, "1/4");
    }

    #[test]
    fn sections_allow_repeated_ingredients() {
        let conn = test_connection();
        let recipe_id = recipe(&conn, "Pie", 8);
        let sections = vec![
            SectionInput {
                name: "Crust".into(),
                instructions: Some("Chill.".into()),
                ingredients: vec![line("butter", "1/2", "cup"), line("flour", "2", "cup")],
            },
            SectionInput {
                name: "Filling".into(),
                instructions: None,
                ingredients: vec![line("butter", "2", "tbsp")],
            },
        ];

        replace_recipe_ingredients(&conn, recipe_id, None, Some(sections.as_slice())).unwrap();

        let stored = RecipeSection::list_for_recipe(&conn, recipe_id).unwrap();
        assert_eq!(stored.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Crust", "Filling"]);

        let lines = RecipeIngredient::get_for_recipe(&conn, recipe_id).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].ingredient_id, lines[2].ingredient_id);
        assert_eq!(lines[2].recipe_section_id, Some(stored[1].id));
    }

    #[test]
    fn replacing_switches_between_flat_and_sectioned() {
        let conn = test_connection();
        let recipe_id = recipe(&conn, "Soup", 4);
        let sections = vec![SectionInput {
            name: "Base".into(),
            instructions: None,
            ingredients: vec![line("onion", "1", "each")],
        }];
        replace_recipe_ingredients(&conn, recipe_id, None, Some(sections.as_slice())).unwrap();

        let flat = vec![line("leek", "2", "each")];
        replace_recipe_ingredients(&conn, recipe_id, Some(flat.as_slice()), None).unwrap();

        assert!(RecipeSection::list_for_recipe(&conn, recipe_id).unwrap().is_empty());
        let details = RecipeIngredient::get_details_for_recipe(&conn, recipe_id).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].ingredient_name, "leek");
    }

    #[test]
    fn rejects_both_shapes_and_bad_lines_without_writing() {
        let conn = test_connection();
        let recipe_id = recipe(&conn, "Toast", 1);
        let flat = vec![line("bread", "2", "slice")];
        replace_recipe_ingredients(&conn, recipe_id, Some(flat.as_slice()), None).unwrap();

        let sections = vec![SectionInput { name: "Top".into(), ..Default::default() }];
        let both = replace_recipe_ingredients(&conn, recipe_id, Some(flat.as_slice()), Some(sections.as_slice()));
        assert!(matches!(both, Err(DbError::Invalid(_))));

        for bad in [line("jam", "0", "tbsp"), line("jam", "a lot", "tbsp"), line("jam", "1", " ")] {
            let result = replace_recipe_ingredients(&conn, recipe_id, Some(std::slice::from_ref(&bad)), None);
            assert!(matches!(result, Err(DbError::Invalid(_))));
        }

        let unnamed = vec![SectionInput { name: " ".into(), ..Default::default() }];
        assert!(replace_recipe_ingredients(&conn, recipe_id, None, Some(unnamed.as_slice())).is_err());

        assert_eq!(RecipeIngredient::count_for_recipe(&conn, recipe_id).unwrap(), 1);
    }
}
