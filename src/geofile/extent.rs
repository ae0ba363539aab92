use geo::{BoundingRect, Intersects};

use super::feature::FeatureCollection;

#[derive(Debug, PartialEq)]
pub enum FitSuggestion {
    /// Some of the data is already visible.
    KeepViewport,
    /// The data lies entirely outside the viewport, center the map on its extent.
    CenterOn { center: geo::Coord, extent: geo::Rect },
    /// There is nothing to fit to.
    NoData,
}

fn collection_coords(collection: &FeatureCollection) -> Vec<geo::Coord> {
    collection
        .features
        .iter()
        .flat_map(|feature| feature.geometry.positions())
        .filter_map(|position| match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(geo::Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

/// Bounding rectangle of all valid coordinates of the collection.
pub fn collection_extent(collection: &FeatureCollection) -> Option<geo::Rect> {
    let points: geo::MultiPoint = collection_coords(collection)
        .into_iter()
        .map(geo::Point::from)
        .collect();
    points.bounding_rect()
}

pub fn fit_viewport(viewport: &geo::Rect, collection: &FeatureCollection) -> FitSuggestion {
    let coords = collection_coords(collection);
    if coords.is_empty() {
        return FitSuggestion::NoData;
    }
    if coords.iter().any(|coord| viewport.intersects(coord)) {
        return FitSuggestion::KeepViewport;
    }
    match collection_extent(collection) {
        Some(extent) => FitSuggestion::CenterOn {
            center: extent.center(),
            extent,
        },
        None => FitSuggestion::NoData,
    }
}
