pub mod extent;
pub mod feature;
pub mod geojson;
