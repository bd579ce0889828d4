//! Geodesic distance and a grid spatial index
//!
//! Distances are great-circle distances on a sphere, computed with the
//! haversine formula. The [`GeoGrid`] buckets business ids into fixed-size
//! latitude/longitude cells so a radius query only has to look at the cells
//! overlapping the query's bounding box.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters used for all spherical distance math
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// A point on the earth's surface, stored as (longitude, latitude) degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range degrees
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        let coord = Self { longitude, latitude };
        coord.validate()?;
        Ok(coord)
    }

    pub fn validate(&self) -> Result<()> {
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        if lon_ok && lat_ok {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                longitude: self.longitude,
                latitude: self.latitude,
            })
        }
    }

    /// Great-circle distance to `other` in meters
    #[inline]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }
}

/// Haversine great-circle distance between two coordinates, in meters
#[inline]
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against h drifting just above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

type CellKey = (i64, i64);

/// Fixed-cell spatial index over business coordinates
#[derive(Debug, Clone)]
pub struct GeoGrid {
    cell_degrees: f64,
    lon_cells: i64,
    cells: AHashMap<CellKey, Vec<String>>,
    positions: AHashMap<String, CellKey>,
}

impl GeoGrid {
    pub fn new(cell_degrees: f64) -> Self {
        let requested = if cell_degrees.is_finite() && cell_degrees > 0.0 {
            cell_degrees.min(90.0)
        } else {
            0.1
        };
        // Longitude cells must tile 360 degrees exactly for wrapped indices to line up
        let lon_cells = ((360.0 / requested).round() as i64).max(4);
        Self {
            cell_degrees: 360.0 / lon_cells as f64,
            lon_cells,
            cells: AHashMap::new(),
            positions: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn lat_cell(&self, latitude: f64) -> i64 {
        ((latitude + 90.0) / self.cell_degrees).floor() as i64
    }

    fn lon_cell(&self, longitude: f64) -> i64 {
        (((longitude + 180.0) / self.cell_degrees).floor() as i64).rem_euclid(self.lon_cells)
    }

    fn key(&self, coord: &Coordinate) -> CellKey {
        (self.lat_cell(coord.latitude), self.lon_cell(coord.longitude))
    }

    /// Insert or move a business
    pub fn insert(&mut self, id: &str, coord: &Coordinate) {
        self.remove(id);
        let key = self.key(coord);
        self.cells.entry(key).or_default().push(id.to_string());
        self.positions.insert(id.to_string(), key);
    }

    pub fn remove(&mut self, id: &str) {
        if let Some(key) = self.positions.remove(id) {
            if let Some(ids) = self.cells.get_mut(&key) {
                ids.retain(|existing| existing != id);
                if ids.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    /// Ids in every cell that may hold a point within `radius` meters of `origin`.
    ///
    /// This is a superset of the true answer; callers filter by exact distance.
    pub fn cells_within(&self, origin: &Coordinate, radius: f64) -> Vec<&str> {
        let angular = (radius / EARTH_RADIUS_METERS).to_degrees();
        let lat_lo = origin.latitude - angular;
        let lat_hi = origin.latitude + angular;

        // Near a pole or for huge radii every longitude is in reach
        let all_lons = lat_lo <= -90.0 || lat_hi >= 90.0 || {
            let widest = lat_lo.abs().max(lat_hi.abs()).to_radians();
            angular / widest.cos() >= 180.0
        };

        let lat_range = self.lat_cell(lat_lo.max(-90.0))..=self.lat_cell(lat_hi.min(90.0));
        let lon_span = if all_lons {
            None
        } else {
            let widest = lat_lo.abs().max(lat_hi.abs()).to_radians();
            let lon_angular = angular / widest.cos();
            // One spare cell each side absorbs rounding at cell edges
            let lo = ((origin.longitude - lon_angular + 180.0) / self.cell_degrees).floor() as i64 - 1;
            let hi = ((origin.longitude + lon_angular + 180.0) / self.cell_degrees).floor() as i64 + 1;
            if hi - lo + 1 >= self.lon_cells {
                None
            } else {
                Some((lo, hi))
            }
        };

        let requested = (lat_range.end() - lat_range.start() + 1)
            * lon_span.map(|(lo, hi)| hi - lo + 1).unwrap_or(self.lon_cells);

        // Walking occupied cells beats probing a mostly empty box
        if requested as usize >= self.cells.len() {
            return self
                .cells
                .iter()
                .filter(|((lat, lon), _)| {
                    lat_range.contains(lat) && lon_in_span(*lon, lon_span, self.lon_cells)
                })
                .flat_map(|(_, ids)| ids.iter().map(String::as_str))
                .collect();
        }

        let mut out = Vec::new();
        for lat in lat_range {
            match lon_span {
                Some((lo, hi)) => {
                    for lon in lo..=hi {
                        if let Some(ids) = self.cells.get(&(lat, lon.rem_euclid(self.lon_cells))) {
                            out.extend(ids.iter().map(String::as_str));
                        }
                    }
                }
                None => {
                    for lon in 0..self.lon_cells {
                        if let Some(ids) = self.cells.get(&(lat, lon)) {
                            out.extend(ids.iter().map(String::as_str));
                        }
                    }
                }
            }
        }
        out
    }
}

fn lon_in_span(lon: i64, span: Option<(i64, i64)>, lon_cells: i64) -> bool {
    match span {
        None => true,
        Some((lo, hi)) => (lo..=hi).any(|candidate| candidate.rem_euclid(lon_cells) == lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters_to_degrees(m: f64) -> f64 {
        (m / EARTH_RADIUS_METERS).to_degrees()
    }

    #[test]
    fn test_distance_along_meridian() {
        let a = Coordinate::new(-115.17, 36.11).unwrap();
        let b = Coordinate::new(-115.17, 36.11 + meters_to_degrees(3000.0)).unwrap();
        assert!((a.distance_to(&b) - 3000.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = Coordinate::new(2.35, 48.85).unwrap();
        let b = Coordinate::new(-0.12, 51.50).unwrap();
        assert_eq!(a.distance_to(&a), 0.0);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
        // Paris to London is roughly 344 km
        let d = a.distance_to(&b);
        assert!(d > 330_000.0 && d < 360_000.0, "got {}", d);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(Coordinate::new(181.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -90.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(180.0, 90.0).is_ok());
    }

    #[test]
    fn test_grid_finds_neighbours_and_skips_far_points() {
        let mut grid = GeoGrid::new(0.05);
        let origin = Coordinate::new(-79.38, 43.65).unwrap();
        grid.insert("near", &Coordinate::new(-79.38, 43.65 + meters_to_degrees(2000.0)).unwrap());
        grid.insert("far", &Coordinate::new(-73.56, 45.50).unwrap());

        let found = grid.cells_within(&origin, 5000.0);
        assert!(found.contains(&"near"));
        assert!(!found.contains(&"far"));
    }

    #[test]
    fn test_grid_wraps_antimeridian() {
        let mut grid = GeoGrid::new(0.1);
        grid.insert("east", &Coordinate::new(179.99, 0.0).unwrap());
        let origin = Coordinate::new(-179.99, 0.0).unwrap();
        assert!(grid.cells_within(&origin, 5000.0).contains(&"east"));
    }

    #[test]
    fn test_cells_tile_the_full_circle() {
        for requested in [0.03, 0.05, 0.7, 7.0] {
            let grid = GeoGrid::new(requested);
            assert!((grid.lon_cells as f64 * grid.cell_degrees - 360.0).abs() < 1e-9);
            assert!((grid.cell_degrees - requested).abs() < requested * 0.1);
        }
    }

    #[test]
    fn test_grid_move_and_remove() {
        let mut grid = GeoGrid::new(0.1);
        grid.insert("a", &Coordinate::new(10.0, 10.0).unwrap());
        grid.insert("a", &Coordinate::new(-10.0, -10.0).unwrap());
        assert_eq!(grid.len(), 1);
        assert!(grid.cells_within(&Coordinate::new(10.0, 10.0).unwrap(), 1000.0).is_empty());
        grid.remove("a");
        assert!(grid.is_empty());
    }
}
