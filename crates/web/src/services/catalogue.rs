//! Item form parsing.
//!
//! The new-item form posts one value per field except `tenon`, which repeats
//! once per joinery technique, so it arrives as raw pairs.

use thiserror::Error;

use rosewood_core::{
    CarveId, DecorationId, MaterialId, PaintId, Price, SandId, SecondCategoryId, SecondSceneId,
    StoveId, StyleId, TenonId, VendorId,
};

use crate::db::NewItem;
use crate::models::{Choice, ItemFormOptions};

/// Longest item name accepted.
const MAX_NAME_LEN: usize = 30;

/// Longest story accepted.
const MAX_STORY_LEN: usize = 2000;

/// Largest dimension accepted, in centimetres.
const MAX_DIMENSION: i32 = 10_000;

/// A field of the item form was missing or invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemFormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} is invalid")]
    Invalid(&'static str),

    #[error("{0} is not one of the listed choices")]
    UnknownChoice(&'static str),
}

/// Item form as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub item: String,
    pub price: String,
    pub material: String,
    pub second_category: String,
    pub second_scene: String,
    pub style: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub stove: String,
    pub carve: String,
    pub sand: String,
    pub paint: String,
    pub decoration: String,
    pub story: String,
    pub tenons: Vec<String>,
}

impl ItemForm {
    /// Collect form pairs. Unknown keys are ignored; repeated single-value
    /// keys keep the last value.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "item" => &mut form.item,
                "price" => &mut form.price,
                "material" => &mut form.material,
                "second_category" => &mut form.second_category,
                "second_scene" => &mut form.second_scene,
                "style" => &mut form.style,
                "length" => &mut form.length,
                "width" => &mut form.width,
                "height" => &mut form.height,
                "stove" => &mut form.stove,
                "carve" => &mut form.carve,
                "sand" => &mut form.sand,
                "paint" => &mut form.paint,
                "decoration" => &mut form.decoration,
                "story" => &mut form.story,
                "tenon" => {
                    form.tenons.push(value);
                    continue;
                }
                _ => continue,
            };
            *slot = value;
        }
        form
    }

    /// Whether the posted form ticked this joinery technique.
    #[must_use]
    pub fn has_tenon(&self, id: &i32) -> bool {
        self.tenons.iter().any(|raw| raw.trim().parse() == Ok(*id))
    }

    /// Validate against the reference choices and build the insert.
    ///
    /// # Errors
    ///
    /// Returns the first field that is missing, malformed or not a listed
    /// choice.
    pub fn validate(
        &self,
        vendor_id: VendorId,
        options: &ItemFormOptions,
    ) -> Result<NewItem, ItemFormError> {
        let item = self.item.trim();
        if item.is_empty() {
            return Err(ItemFormError::Missing("name"));
        }
        if item.chars().count() > MAX_NAME_LEN {
            return Err(ItemFormError::Invalid("name"));
        }
        let price = number("price", &self.price)
            .and_then(|yuan| Price::new(yuan).ok_or(ItemFormError::Invalid("price")))?;
        let story = self.story.trim();
        if story.chars().count() > MAX_STORY_LEN {
            return Err(ItemFormError::Invalid("story"));
        }

        let mut tenon_ids = Vec::with_capacity(self.tenons.len());
        for raw in &self.tenons {
            let id = choice("tenon", raw, &options.tenons)?;
            if !tenon_ids.contains(&TenonId::new(id)) {
                tenon_ids.push(TenonId::new(id));
            }
        }

        Ok(NewItem {
            vendor_id,
            item: item.to_owned(),
            price,
            material_id: MaterialId::new(choice("material", &self.material, &options.materials)?),
            second_category_id: SecondCategoryId::new(choice(
                "category",
                &self.second_category,
                &options.second_categories,
            )?),
            second_scene_id: SecondSceneId::new(choice(
                "scene",
                &self.second_scene,
                &options.second_scenes,
            )?),
            style_id: StyleId::new(choice("style", &self.style, &options.styles)?),
            length: dimension("length", &self.length)?,
            width: dimension("width", &self.width)?,
            height: dimension("height", &self.height)?,
            stove_id: StoveId::new(choice("stove", &self.stove, &options.stoves)?),
            carve_id: CarveId::new(choice("carve", &self.carve, &options.carves)?),
            sand_id: SandId::new(choice("sand", &self.sand, &options.sands)?),
            paint_id: PaintId::new(choice("paint", &self.paint, &options.paints)?),
            decoration_id: DecorationId::new(choice(
                "decoration",
                &self.decoration,
                &options.decorations,
            )?),
            story: story.to_owned(),
            tenon_ids,
        })
    }
}

fn number(field: &'static str, raw: &str) -> Result<i32, ItemFormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ItemFormError::Missing(field));
    }
    raw.parse().map_err(|_| ItemFormError::Invalid(field))
}

fn dimension(field: &'static str, raw: &str) -> Result<i32, ItemFormError> {
    let value = number(field, raw)?;
    if (1..=MAX_DIMENSION).contains(&value) {
        Ok(value)
    } else {
        Err(ItemFormError::Invalid(field))
    }
}

fn choice(field: &'static str, raw: &str, choices: &[Choice]) -> Result<i32, ItemFormError> {
    let id = number(field, raw)?;
    if choices.iter().any(|c| c.id == id) {
        Ok(id)
    } else {
        Err(ItemFormError::UnknownChoice(field))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn options() -> ItemFormOptions {
        let one = |id: i32, name: &str| {
            vec![Choice {
                id,
                name: name.to_string(),
            }]
        };
        ItemFormOptions {
            materials: one(1, "小叶紫檀"),
            second_categories: one(2, "圈椅"),
            second_scenes: one(3, "书房"),
            styles: one(4, "明式"),
            stoves: one(5, "水煮"),
            carves: one(6, "浮雕"),
            sands: one(7, "400"),
            paints: one(8, "生漆"),
            decorations: one(9, "白铜镶嵌"),
            tenons: vec![
                Choice {
                    id: 10,
                    name: "燕尾榫".to_string(),
                },
                Choice {
                    id: 11,
                    name: "抱肩榫".to_string(),
                },
            ],
        }
    }

    fn pairs() -> Vec<(String, String)> {
        [
            ("item", " 圈椅一对 "),
            ("price", "12800"),
            ("material", "1"),
            ("second_category", "2"),
            ("second_scene", "3"),
            ("style", "4"),
            ("length", "60"),
            ("width", "50"),
            ("height", "100"),
            ("stove", "5"),
            ("carve", "6"),
            ("sand", "7"),
            ("paint", "8"),
            ("decoration", "9"),
            ("tenon", "10"),
            ("tenon", "11"),
            ("tenon", "10"),
            ("csrf", "ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_valid_form() {
        let form = ItemForm::from_pairs(pairs());
        assert_eq!(form.tenons.len(), 3);
        assert!(form.has_tenon(&11));
        assert!(!form.has_tenon(&12));

        let item = form.validate(VendorId::new(7), &options()).unwrap();
        assert_eq!(item.item, "圈椅一对");
        assert_eq!(item.price.yuan(), 12800);
        assert_eq!(item.tenon_ids, vec![TenonId::new(10), TenonId::new(11)]);
        assert_eq!(item.height, 100);
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let mut form = ItemForm::from_pairs(pairs());
        form.item = "  ".to_string();
        assert_eq!(
            form.validate(VendorId::new(7), &options()).unwrap_err(),
            ItemFormError::Missing("name")
        );

        let mut form = ItemForm::from_pairs(pairs());
        form.price = "-1".to_string();
        assert_eq!(
            form.validate(VendorId::new(7), &options()).unwrap_err(),
            ItemFormError::Invalid("price")
        );

        let mut form = ItemForm::from_pairs(pairs());
        form.width = "0".to_string();
        assert_eq!(
            form.validate(VendorId::new(7), &options()).unwrap_err(),
            ItemFormError::Invalid("width")
        );
    }

    #[test]
    fn test_unknown_choice() {
        let mut form = ItemForm::from_pairs(pairs());
        form.tenons.push("99".to_string());
        assert_eq!(
            form.validate(VendorId::new(7), &options()).unwrap_err(),
            ItemFormError::UnknownChoice("tenon")
        );
    }
}
