//! Fixture providers for the built-in suite
//!
//! Plain functions, re-invoked per run, never cached. Test data stays next to
//! the code that names it; binary assets (indexed images) live under the
//! fixtures root and are enumerated fail-fast.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Public image URLs the classification endpoint is exercised with. All three
/// are known to classify as "burger".
#[must_use]
pub fn classify_image_urls() -> Vec<&'static str> {
    vec![
        "https://cdn.discordapp.com/icons/525976020919123981/f2ccc3ec3e36988bfa65da0bdae715c8.jpg",
        "https://burger-king-kupon.ru/wp-content/uploads/2022/03/1648284144_48dc525c690ab68339a7226c1087654a.png",
        "https://bigoven-res.cloudinary.com/image/upload/t_recipe-256/hanger-steak-sandwich-with-bourbon-creamed-spinach-2204420.jpg",
    ]
}

/// Meal-plan query window for the shopping-list generation case. The epochs
/// are the UTC midnights of the two dates; the server echoes them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealPlanWindow {
    pub start_date: &'static str,
    pub end_date: &'static str,
    pub start_epoch: i64,
    pub end_epoch: i64,
}

#[must_use]
pub const fn meal_plan_window() -> MealPlanWindow {
    MealPlanWindow {
        start_date: "2022-02-06",
        end_date: "2022-02-28",
        start_epoch: 1_644_105_600,
        end_epoch: 1_646_006_400,
    }
}

/// Body for the add-to-shopping-list case.
#[must_use]
pub fn shopping_list_item() -> Value {
    json!({
        "item": "1 package baking powder",
        "aisle": "Baking",
        "parse": true,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("indexed fixture missing: {path}")]
    Missing { path: PathBuf },
}

/// Enumerate `<root>/<group>/<i>.png` for `i` in `0..count`.
///
/// Fails fast: an absent index aborts the enumeration instead of returning a
/// shorter list, so a broken fixture set can never pass vacuously.
///
/// # Errors
///
/// Returns [`FixtureError::Missing`] for the first absent file.
pub fn indexed_images(root: &Path, group: &str, count: usize) -> Result<Vec<PathBuf>, FixtureError> {
    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let path = root.join(group).join(format!("{i}.png"));
        if !path.is_file() {
            return Err(FixtureError::Missing { path });
        }
        paths.push(path);
    }
    Ok(paths)
}
