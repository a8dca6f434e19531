use bevy::prelude::*;
use rand::Rng;
use rand::thread_rng;
use serde::Deserialize;

/// Either catalog shape the backend serves: `{ "images": [...] }` or a
/// bare array. Both mean "a sequence of identifiers".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogShape {
    Wrapped { images: Vec<String> },
    Bare(Vec<String>),
}

/// Full list of available image identifiers, loaded as a JSON asset.
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ImageCatalog(CatalogShape);

impl ImageCatalog {
    pub fn identifiers(&self) -> &[String] {
        match &self.0 {
            CatalogShape::Wrapped { images } => images,
            CatalogShape::Bare(images) => images,
        }
    }
}

/// Per-image average metric the sort endpoint orders by. Computed entirely
/// server-side; the engine only consumes the ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMetric {
    Red,
    Green,
    Blue,
    Luminance,
}

impl SortMetric {
    pub fn wire_name(self) -> &'static str {
        match self {
            SortMetric::Red => "red",
            SortMetric::Green => "green",
            SortMetric::Blue => "blue",
            SortMetric::Luminance => "luminance",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "red" => Some(SortMetric::Red),
            "green" => Some(SortMetric::Green),
            "blue" => Some(SortMetric::Blue),
            "luminance" => Some(SortMetric::Luminance),
            _ => None,
        }
    }
}

/// Substring category filter preserving catalog order. `None` or an empty
/// category is the identity.
pub fn filter_by_category(identifiers: &[String], category: Option<&str>) -> Vec<String> {
    match category {
        None | Some("") => identifiers.to_vec(),
        Some(category) => identifiers
            .iter()
            .filter(|identifier| identifier.contains(category))
            .cloned()
            .collect(),
    }
}

/// Uniform sample without replacement of `min(n, len)` identifiers.
/// A partial Fisher-Yates via `rand::seq::index::sample`; the old
/// comparator-random-sort idiom was not a uniform permutation.
pub fn shuffle_select<R: Rng>(rng: &mut R, identifiers: &[String], n: usize) -> Vec<String> {
    let amount = n.min(identifiers.len());
    rand::seq::index::sample(rng, identifiers.len(), amount)
        .into_iter()
        .map(|index| identifiers[index].clone())
        .collect()
}

/// Filter then sample: the selection every non-sort command materialises.
pub fn plan_selection(
    identifiers: &[String],
    category: Option<&str>,
    max_images: usize,
) -> Vec<String> {
    let filtered = filter_by_category(identifiers, category);
    shuffle_select(&mut thread_rng(), &filtered, max_images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn catalog_accepts_both_wire_shapes() {
        let wrapped: ImageCatalog = serde_json::from_str(r#"{"images":["aY1.png"]}"#).unwrap();
        assert_eq!(wrapped.identifiers(), &["aY1.png".to_string()]);

        let bare: ImageCatalog = serde_json::from_str(r#"["aY1.png","bY2.png"]"#).unwrap();
        assert_eq!(bare.identifiers().len(), 2);
    }

    #[test]
    fn filter_matches_substring_in_order() {
        let identifiers = catalog(&["aY1.png", "bY2.png", "cY1.png"]);
        let filtered = filter_by_category(&identifiers, Some("Y1"));
        assert_eq!(filtered, catalog(&["aY1.png", "cY1.png"]));
    }

    #[test]
    fn empty_category_is_identity() {
        let identifiers = catalog(&["aY1.png", "bY2.png"]);
        assert_eq!(filter_by_category(&identifiers, None), identifiers);
        assert_eq!(filter_by_category(&identifiers, Some("")), identifiers);
    }

    #[test]
    fn shuffle_select_clamps_to_pool_size() {
        let identifiers = catalog(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(shuffle_select(&mut rng, &identifiers, 10).len(), 3);
        assert_eq!(shuffle_select(&mut rng, &identifiers, 2).len(), 2);
        assert!(shuffle_select(&mut rng, &[], 5).is_empty());
    }

    #[test]
    fn shuffle_select_has_no_duplicates() {
        let identifiers: Vec<String> = (0..40).map(|i| format!("img{i}.png")).collect();
        let mut rng = StdRng::seed_from_u64(99);
        let mut selected = shuffle_select(&mut rng, &identifiers, 25);
        let before = selected.len();
        selected.sort();
        selected.dedup();
        assert_eq!(selected.len(), before);
        assert!(selected.iter().all(|id| identifiers.contains(id)));
    }

    #[test]
    fn plan_selection_respects_max_and_filter() {
        let identifiers = catalog(&["aY1.png", "bY2.png", "cY1.png", "dY1.png"]);
        let plan = plan_selection(&identifiers, Some("Y1"), 2);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|id| id.contains("Y1")));

        // Idempotent on empty: an empty plan stays empty, twice in a row.
        assert!(plan_selection(&[], Some("Y1"), 50).is_empty());
        assert!(plan_selection(&[], Some("Y1"), 50).is_empty());
    }

    #[test]
    fn sort_metric_wire_names_round_trip() {
        for metric in [
            SortMetric::Red,
            SortMetric::Green,
            SortMetric::Blue,
            SortMetric::Luminance,
        ] {
            assert_eq!(SortMetric::from_wire(metric.wire_name()), Some(metric));
        }
        assert_eq!(SortMetric::from_wire("hue"), None);
    }
}
