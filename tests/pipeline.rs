//! Полный цикл: загрузка каталога, обучение, предсказание, поиск, отчёт

use std::io::Write;

use fan_select_ml::config::{BalancingStrategy, TrainingConfig};
use fan_select_ml::preprocessing::NoBalancing;
use fan_select_ml::{
    Catalog, CatalogRow, LoadError, PredictionService, QueryParams, ServiceError, TrainingError,
};
use tempfile::NamedTempFile;

fn row(pressure: f64, flow: f64, speed: f64, power: f64, manufacturer: &str) -> CatalogRow {
    CatalogRow {
        pressure,
        flow,
        speed,
        rated_power: power,
        manufacturer: manufacturer.to_string(),
    }
}

fn three_row_catalog() -> Catalog {
    Catalog::from_rows(vec![
        row(1000.0, 500.0, 1450.0, 5.5, "A"),
        row(1200.0, 600.0, 1450.0, 7.0, "B"),
        row(1000.0, 505.0, 1450.0, 5.6, "A"),
    ])
}

fn unbalanced_config() -> TrainingConfig {
    TrainingConfig {
        balancing: BalancingStrategy::None,
        ..TrainingConfig::default()
    }
}

#[test]
fn test_three_row_scenario() {
    let service = PredictionService::train(three_row_catalog(), &unbalanced_config()).unwrap();

    let matched = service.nearest_match(1000.0, 500.0, 1450.0).unwrap();
    assert_eq!(matched.index, 0);
    assert_eq!(matched.distance, 0.0);
    assert_eq!(matched.row, row(1000.0, 500.0, 1450.0, 5.5, "A"));

    let prediction = service.predict(1000.0, 500.0, 1450.0).unwrap();
    assert_eq!(prediction.manufacturer, "A");
    assert!(
        prediction.power >= 5.45 && prediction.power <= 5.65,
        "unexpected power {}",
        prediction.power
    );
}

#[test]
fn test_custom_balancer_is_accepted() {
    let service = PredictionService::train_with_balancer(
        three_row_catalog(),
        &TrainingConfig::default(),
        &NoBalancing,
    )
    .unwrap();
    assert_eq!(service.training_report().classifier_samples, 3);
}

#[test]
fn test_default_smote_rejects_single_example_manufacturer() {
    let err = PredictionService::train(three_row_catalog(), &TrainingConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TrainingError::SingletonManufacturer { ref manufacturer } if manufacturer == "B"
    ));
}

#[test]
fn test_invalid_input_is_reported_per_request() {
    let service = PredictionService::train(three_row_catalog(), &unbalanced_config()).unwrap();

    assert!(matches!(
        service.predict(f64::NAN, 500.0, 1450.0),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        service.predict_query(&QueryParams {
            pressure: Some(1000.0),
            flow: None,
            speed: Some(1450.0),
        }),
        Err(ServiceError::InvalidInput(_))
    ));

    // Сервис продолжает работать после ошибки
    assert_eq!(service.predict(1200.0, 600.0, 1450.0).unwrap().manufacturer, "B");
}

#[test]
fn test_report_record_from_nearest_match() {
    let service = PredictionService::train(three_row_catalog(), &unbalanced_config()).unwrap();
    let record = service
        .build_report(&QueryParams::new(1190.0, 600.0, 1450.0))
        .unwrap();

    assert_eq!(record.matched.manufacturer, "B");
    assert_eq!(record.distance, 10.0);
    assert_eq!(record.query.pressure, 1190.0);
    assert!(record.summary.contains("Manufacturer: B"));
    assert!(record.summary.contains("Rated Power: 7 kW"));
}

#[test]
fn test_csv_catalog_with_units_end_to_end() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "Manufacturer,\"Pressure, static\",Actual flow volume air/gas,Nominal rotation speed,Rated power"
    )
    .unwrap();
    for (manufacturer, pressure, flow, speed, power) in [
        ("Acme ", "\"1,000 Pa\"", "\"5,000 m3/h\"", "1450 1/min", "\"5,500 W\""),
        ("Acme", "1010 Pa", "\"5,100 m3/h\"", "1450 1/min", "\"5,600 W\""),
        ("Acme", "1020 Pa", "\"5,200 m3/h\"", "1450 1/min", "\"5,700 W\""),
        (" Blower", "\"2,000 Pa\"", "\"9,000 m3/h\"", "2900 1/min", "\"15,000 W\""),
        ("Blower", "\"2,050 Pa\"", "\"9,500 m3/h\"", "2900 1/min", "\"15,500 W\""),
        ("Blower", "", "\"9,500 m3/h\"", "2900 1/min", "\"15,500 W\""),
    ] {
        writeln!(file, "{},{},{},{},{}", manufacturer, pressure, flow, speed, power).unwrap();
    }

    let (catalog, stats) = Catalog::load(file.path()).expect("load catalog");
    assert_eq!(stats.total, 6);
    assert_eq!(stats.missing_features, 1);
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.rows()[0].rated_power, 5500.0);
    assert_eq!(catalog.rows()[3].manufacturer, "Blower");

    let service = PredictionService::train(catalog, &TrainingConfig::default()).unwrap();
    assert_eq!(service.labels().len(), 2);
    assert_eq!(service.training_report().classifier_samples, 6);
    assert_eq!(service.training_report().regressor_samples, 5);

    let prediction = service.predict(2000.0, 9000.0, 2900.0).unwrap();
    assert_eq!(prediction.manufacturer, "Blower");
    assert!((prediction.power - 15000.0).abs() < 50.0);
}

#[test]
fn test_corrupt_catalog_fails_to_load() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "\"Pressure, static\",Actual flow volume air/gas,Rated power,Nominal rotation speed,Manufacturer"
    )
    .unwrap();
    writeln!(file, "1000,5000,5.5,fast,A").unwrap();

    assert!(matches!(
        Catalog::load(file.path()),
        Err(LoadError::InvalidNumber { .. })
    ));
}

#[test]
fn test_missing_catalog_file() {
    assert!(matches!(
        Catalog::load("/nonexistent/fans.csv"),
        Err(LoadError::Io(_))
    ));
}
