pub mod edit_graph;
pub mod entity;
pub mod host;
