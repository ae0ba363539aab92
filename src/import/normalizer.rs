use crate::geofile::feature::{Position, SourceGeometry};

use super::error::ImportError;

/// An ordered coordinate sequence extracted from a feature's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub coords: Vec<geo::Coord>,
    pub is_areal: bool,
}

/// Split a geometry into the rings the synthesizer turns into entities.
///
/// Polygons contribute their outer ring only. Holes would need multipolygon relations, which the
/// importer does not create.
pub fn normalize(geometry: &SourceGeometry) -> Result<Vec<Ring>, ImportError> {
    match geometry {
        SourceGeometry::Point(position) => Ok(vec![Ring {
            coords: vec![to_coord(position)?],
            is_areal: false,
        }]),
        SourceGeometry::LineString(line) => Ok(vec![line_ring(line)?]),
        SourceGeometry::MultiLineString(lines) => {
            if lines.is_empty() {
                return Err(ImportError::malformed("MultiLineString without lines"));
            }
            lines.iter().map(|line| line_ring(line)).collect()
        }
        SourceGeometry::Polygon(rings) => Ok(vec![outer_ring(rings)?]),
        SourceGeometry::MultiPolygon(polygons) => {
            if polygons.is_empty() {
                return Err(ImportError::malformed("MultiPolygon without polygons"));
            }
            polygons.iter().map(|rings| outer_ring(rings)).collect()
        }
        SourceGeometry::Unsupported(_) => Err(ImportError::UnknownGeometryKind {
            geometry_type: geometry.kind_name().to_string(),
        }),
        SourceGeometry::Empty => Err(ImportError::malformed("feature has no geometry")),
    }
}

fn to_coord(position: &Position) -> Result<geo::Coord, ImportError> {
    match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(geo::Coord { x: *x, y: *y }),
        _ => Err(ImportError::malformed(format!(
            "{:?} is not a finite coordinate pair",
            position
        ))),
    }
}

fn to_coords(positions: &[Position]) -> Result<Vec<geo::Coord>, ImportError> {
    positions.iter().map(to_coord).collect()
}

fn line_ring(line: &Vec<Position>) -> Result<Ring, ImportError> {
    if 2 > line.len() {
        return Err(ImportError::malformed(format!(
            "line with {} coordinates, at least two needed",
            line.len()
        )));
    }
    Ok(Ring {
        coords: to_coords(line)?,
        is_areal: false,
    })
}

fn outer_ring(rings: &Vec<Vec<Position>>) -> Result<Ring, ImportError> {
    let outer = rings
        .first()
        .ok_or_else(|| ImportError::malformed("polygon without an outer ring"))?;
    if 3 > outer.len() {
        return Err(ImportError::malformed(format!(
            "polygon ring with {} coordinates, at least three needed",
            outer.len()
        )));
    }
    Ok(Ring {
        coords: to_coords(outer)?,
        is_areal: true,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{geofile::feature::SourceGeometry, import::error::ImportError};

    use super::{normalize, Ring};

    fn coords(pairs: &[(f64, f64)]) -> Vec<geo::Coord> {
        pairs.iter().map(|(x, y)| geo::Coord { x: *x, y: *y }).collect()
    }

    #[test]
    fn test_point_yields_single_coordinate() {
        let rings = normalize(&SourceGeometry::Point(vec![10.0, 20.0, 5.0])).unwrap();
        assert_eq!(
            rings,
            vec![Ring {
                coords: coords(&[(10.0, 20.0)]),
                is_areal: false
            }]
        );
    }

    #[test]
    fn test_multilinestring_yields_ring_per_line() {
        let geometry = SourceGeometry::MultiLineString(vec![
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            vec![vec![2.0, 2.0], vec![3.0, 3.0], vec![4.0, 4.0]],
        ]);
        let rings = normalize(&geometry).unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[1].coords, coords(&[(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]));
        assert!(rings.iter().all(|ring| !ring.is_areal));
    }

    #[test]
    fn test_polygon_drops_holes() {
        let geometry = SourceGeometry::Polygon(vec![
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]],
            vec![vec![0.2, 0.2], vec![0.4, 0.2], vec![0.4, 0.4], vec![0.2, 0.2]],
        ]);
        let rings = normalize(&geometry).unwrap();
        assert_eq!(
            rings,
            vec![Ring {
                coords: coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
                is_areal: true
            }]
        );
    }

    #[test]
    fn test_multipolygon_yields_outer_ring_per_polygon() {
        let square = |offset: f64| {
            vec![
                vec![offset, 0.0],
                vec![offset + 1.0, 0.0],
                vec![offset + 1.0, 1.0],
                vec![offset, 0.0],
            ]
        };
        let geometry =
            SourceGeometry::MultiPolygon(vec![vec![square(0.0)], vec![square(5.0), square(5.0)]]);
        let rings = normalize(&geometry).unwrap();
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|ring| ring.is_areal && ring.coords.len() == 4));
        assert_eq!(rings[1].coords[0], geo::Coord { x: 5.0, y: 0.0 });
    }

    #[rstest]
    #[case(SourceGeometry::Point(vec![1.0]))]
    #[case(SourceGeometry::Point(vec![f64::NAN, 1.0]))]
    #[case(SourceGeometry::LineString(vec![vec![0.0, 0.0]]))]
    #[case(SourceGeometry::LineString(vec![vec![0.0, 0.0], vec![1.0, f64::INFINITY]]))]
    #[case(SourceGeometry::MultiLineString(vec![]))]
    #[case(SourceGeometry::Polygon(vec![]))]
    #[case(SourceGeometry::Polygon(vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]]]))]
    #[case(SourceGeometry::MultiPolygon(vec![]))]
    #[case(SourceGeometry::Empty)]
    fn test_malformed_geometry(#[case] geometry: SourceGeometry) {
        assert!(matches!(
            normalize(&geometry),
            Err(ImportError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn test_unsupported_geometry_kind() {
        let result = normalize(&SourceGeometry::Unsupported("GeometryCollection".to_string()));
        assert_eq!(
            result,
            Err(ImportError::UnknownGeometryKind {
                geometry_type: "GeometryCollection".to_string()
            })
        );
    }
}
