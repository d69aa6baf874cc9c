//! Поиск ближайшего вентилятора в каталоге
//!
//! Расстояние считается в исходных единицах (Па, м³/ч, 1/мин), без
//! масштабирования. При равных расстояниях побеждает строка, встретившаяся
//! в каталоге раньше.

use crate::catalog::Catalog;
use crate::error::ServiceError;
use crate::types::{FeatureVector, MatchResult};

pub fn nearest_match(catalog: &Catalog, query: &FeatureVector) -> Result<MatchResult, ServiceError> {
    let mut best: Option<(usize, f64)> = None;

    for (index, row) in catalog.rows().iter().enumerate() {
        let distance = query.distance(&row.features());
        // Строгое сравнение сохраняет первую из равноудалённых строк
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    let (index, distance) = best.ok_or(ServiceError::EmptyCatalog)?;
    Ok(MatchResult {
        row: catalog.rows()[index].clone(),
        index,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRow;

    fn row(pressure: f64, flow: f64, speed: f64, manufacturer: &str) -> CatalogRow {
        CatalogRow {
            pressure,
            flow,
            speed,
            rated_power: 1.0,
            manufacturer: manufacturer.to_string(),
        }
    }

    fn query(pressure: f64, flow: f64, speed: f64) -> FeatureVector {
        FeatureVector::try_new(pressure, flow, speed).unwrap()
    }

    #[test]
    fn test_exact_match_has_zero_distance() {
        let catalog = Catalog::from_rows(vec![
            row(1200.0, 600.0, 1450.0, "B"),
            row(1000.0, 500.0, 1450.0, "A"),
        ]);
        let result = nearest_match(&catalog, &query(1000.0, 500.0, 1450.0)).unwrap();
        assert_eq!(result.index, 1);
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.row.manufacturer, "A");
    }

    #[test]
    fn test_tie_returns_first_in_catalog_order() {
        let catalog = Catalog::from_rows(vec![
            row(900.0, 500.0, 1450.0, "first"),
            row(1100.0, 500.0, 1450.0, "second"),
        ]);
        let result = nearest_match(&catalog, &query(1000.0, 500.0, 1450.0)).unwrap();
        assert_eq!(result.row.manufacturer, "first");
        assert_eq!(result.distance, 100.0);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let catalog = Catalog::from_rows(vec![
            row(800.0, 400.0, 960.0, "A"),
            row(1000.0, 520.0, 1450.0, "B"),
            row(1300.0, 700.0, 2900.0, "C"),
        ]);
        let q = query(1010.0, 515.0, 1400.0);
        let first = nearest_match(&catalog, &q).unwrap();
        for _ in 0..10 {
            assert_eq!(nearest_match(&catalog, &q).unwrap(), first);
        }
    }

    #[test]
    fn test_uses_raw_units() {
        // Скорость доминирует над давлением в немасштабированном пространстве
        let catalog = Catalog::from_rows(vec![
            row(1000.0, 500.0, 2900.0, "same pressure"),
            row(1500.0, 500.0, 1450.0, "same speed"),
        ]);
        let result = nearest_match(&catalog, &query(1000.0, 500.0, 1450.0)).unwrap();
        assert_eq!(result.row.manufacturer, "same speed");
        assert_eq!(result.distance, 500.0);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::default();
        assert_eq!(
            nearest_match(&catalog, &query(1.0, 1.0, 1.0)),
            Err(ServiceError::EmptyCatalog)
        );
    }
}
