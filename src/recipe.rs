//! Recipes, the browsable recipe set and its illustrations.

use crate::intake::ImagePayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A suggested dish, as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Dish name.
    pub title: String,
    /// Free-form cooking time, e.g. "25 minutes".
    pub cooking_time: String,
    /// Usually one of Easy/Medium/Hard, but not guaranteed.
    pub difficulty: String,
    /// Ingredients, in the order given.
    pub ingredients: Vec<String>,
    /// Steps, in the order given.
    pub instructions: Vec<String>,
    /// Description of the finished dish, used to synthesize an illustration.
    pub visual_description: String,
}

impl Recipe {
    /// Parses [`Recipe::difficulty`] leniently.
    pub fn difficulty_level(&self) -> Option<Difficulty> {
        self.difficulty.parse().ok()
    }
}

/// Difficulty levels the model is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Medium.
    Medium,
    /// Hard.
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "beginner" => Ok(Self::Easy),
            "medium" | "moderate" | "intermediate" => Ok(Self::Medium),
            "hard" | "difficult" | "advanced" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "Easy"),
            Self::Medium => write!(f, "Medium"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

/// An ordered batch of recipes with a wrapping cursor.
///
/// The cursor is always in `[0, len)` while the set is non-empty and stays
/// at 0 while it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSet {
    recipes: Vec<Recipe>,
    cursor: usize,
}

impl RecipeSet {
    /// Creates a set with the cursor on the first recipe.
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes, cursor: 0 }
    }

    /// All recipes in order.
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// True if there are no recipes.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Current cursor position, or `None` for an empty set.
    pub fn cursor(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.cursor)
    }

    /// The recipe under the cursor.
    pub fn current(&self) -> Option<&Recipe> {
        self.recipes.get(self.cursor)
    }

    /// Moves to the next recipe, wrapping to the first.
    pub fn advance(&mut self) {
        if self.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.len();
    }

    /// Moves to the previous recipe, wrapping to the last.
    pub fn retreat(&mut self) {
        if self.is_empty() {
            return;
        }
        self.cursor = (self.cursor + self.len() - 1) % self.len();
    }

    /// Removes every recipe and resets the cursor.
    pub fn clear(&mut self) {
        self.recipes.clear();
        self.cursor = 0;
    }

    /// Iterates over recipes.
    pub fn iter(&self) -> std::slice::Iter<'_, Recipe> {
        self.recipes.iter()
    }
}

impl From<Vec<Recipe>> for RecipeSet {
    fn from(recipes: Vec<Recipe>) -> Self {
        Self::new(recipes)
    }
}

impl<'a> IntoIterator for &'a RecipeSet {
    type Item = &'a Recipe;
    type IntoIter = std::slice::Iter<'a, Recipe>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Synthesized dish images keyed by recipe index.
///
/// A missing entry means "pending or failed"; neither is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IllustrationMap {
    images: BTreeMap<usize, ImagePayload>,
}

impl IllustrationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the illustration for one recipe, replacing any previous one.
    pub fn insert(&mut self, index: usize, image: ImagePayload) {
        self.images.insert(index, image);
    }

    /// Illustration for a recipe, if it has arrived.
    pub fn get(&self, index: usize) -> Option<&ImagePayload> {
        self.images.get(&index)
    }

    /// True if the recipe at `index` has an illustration.
    pub fn contains(&self, index: usize) -> bool {
        self.images.contains_key(&index)
    }

    /// Number of illustrations present.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True if no illustration has arrived.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drops every illustration.
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Iterates in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ImagePayload)> {
        self.images.iter().map(|(i, img)| (*i, img))
    }
}

#[cfg(test)]
pub(crate) fn sample_recipe(title: &str) -> Recipe {
    Recipe {
        title: title.to_string(),
        cooking_time: "20 minutes".into(),
        difficulty: "Easy".into(),
        ingredients: vec!["eggs".into(), "spinach".into()],
        instructions: vec!["Whisk".into(), "Cook".into()],
        visual_description: format!("{title} on a plate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(n: usize) -> RecipeSet {
        RecipeSet::new((0..n).map(|i| sample_recipe(&format!("dish {i}"))).collect())
    }

    #[test]
    fn test_recipe_deserializes_camel_case() {
        let json = r#"{
            "title": "Shakshuka",
            "cookingTime": "30 minutes",
            "difficulty": "Medium",
            "ingredients": ["eggs", "tomatoes"],
            "instructions": ["Simmer sauce", "Poach eggs"],
            "visualDescription": "A skillet of eggs in red sauce"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.cooking_time, "30 minutes");
        assert_eq!(recipe.difficulty_level(), Some(Difficulty::Medium));
        assert_eq!(recipe.instructions.len(), 2);
    }

    #[test]
    fn test_difficulty_parsing_is_lenient() {
        assert_eq!(" EASY ".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("Intermediate".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("chef's kiss".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
    }

    #[test]
    fn test_cursor_wraps_both_ways() {
        let mut set = set_of(3);
        assert_eq!(set.cursor(), Some(0));

        set.retreat();
        assert_eq!(set.cursor(), Some(2));
        set.advance();
        assert_eq!(set.cursor(), Some(0));

        for _ in 0..4 {
            set.advance();
        }
        assert_eq!(set.cursor(), Some(1));
        assert_eq!(set.current().unwrap().title, "dish 1");
    }

    #[test]
    fn test_cursor_stays_in_range_for_any_sequence() {
        for len in 1..=5 {
            let mut set = set_of(len);
            for step in 0..50usize {
                let before = set.cursor().unwrap();
                if step % 3 == 0 {
                    set.retreat();
                    set.advance();
                    assert_eq!(set.cursor(), Some(before));
                } else if step % 2 == 0 {
                    set.advance();
                } else {
                    set.retreat();
                }
                assert!(set.cursor().unwrap() < len);
            }
        }
    }

    #[test]
    fn test_navigation_on_empty_set_is_noop() {
        let mut set = RecipeSet::default();
        set.advance();
        set.retreat();
        assert_eq!(set.cursor(), None);
        assert!(set.current().is_none());
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut set = set_of(3);
        set.advance();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.cursor(), None);
    }

    #[test]
    fn test_illustration_map_is_keyed_by_index() {
        let mut map = IllustrationMap::new();
        map.insert(2, ImagePayload::new("two", "image/png"));
        map.insert(0, ImagePayload::new("zero", "image/png"));

        assert!(map.contains(0));
        assert!(!map.contains(1));
        assert_eq!(map.get(2).unwrap().data, "two");
        let keys: Vec<usize> = map.iter().map(|(i, _)| i).collect();
        assert_eq!(keys, vec![0, 2]);
    }
}
