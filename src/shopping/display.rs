//! Presentation order for stored shopping list items

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::DisplayMode;

/// Where an item sits in the list and in the store
#[derive(Debug, Clone, Copy)]
pub struct ItemPlacement<'a> {
    pub id: i64,
    pub ingredient_name: &'a str,
    pub sort_order: Option<i64>,
    pub is_purchased: bool,
    pub store_id: Option<i64>,
    pub store_name: Option<&'a str>,
    pub section_id: Option<i64>,
    pub section_name: Option<&'a str>,
    pub section_sort_order: Option<i64>,
}

pub trait Placed {
    fn placement(&self) -> ItemPlacement<'_>;
}

/// Items sharing an effective store and section
#[derive(Debug, Clone, Serialize)]
pub struct ItemGroup<T> {
    pub grocery_store_id: Option<i64>,
    pub grocery_store_name: Option<String>,
    pub grocery_store_section_id: Option<i64>,
    pub grocery_store_section_name: Option<String>,
    pub items: Vec<T>,
}

/// Sort items in place for the given display mode
pub fn order_items<T: Placed>(items: &mut [T], mode: DisplayMode) {
    items.sort_by(|a, b| compare(&a.placement(), &b.placement(), mode));
}

/// Split store-ordered items into store/section groups. Groups appear in
/// the order of their first item; purchased items join their group even
/// though they sort after every unpurchased item.
pub fn group_by_store<T: Placed>(items: Vec<T>) -> Vec<ItemGroup<T>> {
    let mut groups: Vec<ItemGroup<T>> = Vec::new();

    for item in items {
        let p = item.placement();
        let existing = groups.iter().position(|g| {
            g.grocery_store_id == p.store_id && g.grocery_store_section_id == p.section_id
        });

        let slot = match existing {
            Some(slot) => slot,
            None => {
                groups.push(ItemGroup {
                    grocery_store_id: p.store_id,
                    grocery_store_name: p.store_name.map(str::to_string),
                    grocery_store_section_id: p.section_id,
                    grocery_store_section_name: p.section_name.map(str::to_string),
                    items: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[slot].items.push(item);
    }

    groups
}

// Purchased items sink to the bottom in every mode.
fn compare(a: &ItemPlacement, b: &ItemPlacement, mode: DisplayMode) -> Ordering {
    let by_position = match mode {
        DisplayMode::Manual => none_last(a.sort_order, b.sort_order, |x, y| x.cmp(&y))
            .then_with(|| by_name(a, b)),
        DisplayMode::Alphabetical => by_name(a, b),
        DisplayMode::Store => none_first(a.store_name, b.store_name, cmp_caseless)
            .then_with(|| a.store_id.cmp(&b.store_id))
            .then_with(|| {
                none_first(a.section_id, b.section_id, |_, _| {
                    a.section_sort_order
                        .unwrap_or(0)
                        .cmp(&b.section_sort_order.unwrap_or(0))
                        .then_with(|| {
                            none_first(a.section_name, b.section_name, cmp_caseless)
                        })
                        .then_with(|| a.section_id.cmp(&b.section_id))
                })
            })
            .then_with(|| by_name(a, b)),
    };

    a.is_purchased
        .cmp(&b.is_purchased)
        .then(by_position)
        .then_with(|| a.id.cmp(&b.id))
}

fn by_name(a: &ItemPlacement, b: &ItemPlacement) -> Ordering {
    cmp_caseless(a.ingredient_name, b.ingredient_name)
}

fn cmp_caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn none_last<V: Copy>(a: Option<V>, b: Option<V>, cmp: impl FnOnce(V, V) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn none_first<V: Copy>(a: Option<V>, b: Option<V>, cmp: impl FnOnce(V, V) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: i64,
        name: &'static str,
        sort_order: Option<i64>,
        purchased: bool,
        store: Option<(i64, &'static str)>,
        section: Option<(i64, &'static str, i64)>,
    }

    impl Placed for Row {
        fn placement(&self) -> ItemPlacement<'_> {
            ItemPlacement {
                id: self.id,
                ingredient_name: self.name,
                sort_order: self.sort_order,
                is_purchased: self.purchased,
                store_id: self.store.map(|s| s.0),
                store_name: self.store.map(|s| s.1),
                section_id: self.section.map(|s| s.0),
                section_name: self.section.map(|s| s.1),
                section_sort_order: self.section.map(|s| s.2),
            }
        }
    }

    fn row(id: i64, name: &'static str, sort_order: Option<i64>) -> Row {
        Row { id, name, sort_order, purchased: false, store: None, section: None }
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn manual_mode_uses_sort_order_with_unset_last() {
        let mut rows = vec![row(1, "b", None), row(2, "a", Some(2)), row(3, "c", Some(1)), row(4, "d", None)];
        order_items(&mut rows, DisplayMode::Manual);
        assert_eq!(ids(&rows), vec![3, 2, 1, 4]);
    }

    #[test]
    fn manual_mode_breaks_ties_by_name_and_sinks_purchased() {
        let mut rows = vec![
            row(1, "zucchini", Some(1)),
            Row { purchased: true, ..row(2, "basil", Some(0)) },
            row(3, "apple", Some(1)),
        ];
        order_items(&mut rows, DisplayMode::Manual);
        assert_eq!(ids(&rows), vec![3, 1, 2]);
    }

    #[test]
    fn alphabetical_mode_ignores_case() {
        let mut rows = vec![row(1, "onion", Some(1)), row(2, "Apple", Some(2)), row(3, "banana", Some(3))];
        order_items(&mut rows, DisplayMode::Alphabetical);
        assert_eq!(ids(&rows), vec![2, 3, 1]);

        rows[0].purchased = true;
        order_items(&mut rows, DisplayMode::Alphabetical);
        assert_eq!(ids(&rows), vec![3, 1, 2]);
    }

    #[test]
    fn store_mode_groups_by_store_then_section() {
        let produce = Some((10, "Produce", 1));
        let dairy = Some((11, "Dairy", 2));
        let mut rows = vec![
            Row { store: None, ..row(1, "salt", None) },
            Row { store: Some((1, "Market")), section: dairy, ..row(2, "milk", None) },
            Row { store: Some((1, "Market")), section: produce, ..row(3, "onion", None) },
            Row { store: Some((2, "Bakery")), section: None, ..row(4, "bread", None) },
            Row { store: Some((1, "Market")), section: produce, ..row(5, "apple", None) },
            Row { store: Some((1, "Market")), section: None, ..row(6, "foil", None) },
        ];

        order_items(&mut rows, DisplayMode::Store);
        assert_eq!(ids(&rows), vec![1, 4, 6, 5, 3, 2]);

        let groups = group_by_store(rows);
        let shape: Vec<(Option<String>, Option<String>, usize)> = groups
            .iter()
            .map(|g| (g.grocery_store_name.clone(), g.grocery_store_section_name.clone(), g.items.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, None, 1),
                (Some("Bakery".to_string()), None, 1),
                (Some("Market".to_string()), None, 1),
                (Some("Market".to_string()), Some("Produce".to_string()), 2),
                (Some("Market".to_string()), Some("Dairy".to_string()), 1),
            ]
        );
    }

    #[test]
    fn purchased_items_stay_in_their_store_group() {
        let produce = Some((10, "Produce", 1));
        let mut rows = vec![
            Row { purchased: true, store: Some((1, "Market")), section: produce, ..row(1, "apple", None) },
            Row { store: Some((1, "Market")), section: produce, ..row(2, "onion", None) },
            row(3, "salt", None),
        ];

        order_items(&mut rows, DisplayMode::Store);
        assert_eq!(ids(&rows), vec![3, 2, 1]);

        let groups = group_by_store(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].grocery_store_id, None);
        assert_eq!(groups[1].items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }
}
