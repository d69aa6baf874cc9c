//! Загрузка и очистка каталога вентиляторов

use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2};

use crate::error::LoadError;
use crate::types::{CatalogRow, N_FEATURES};

pub const COL_PRESSURE: &str = "Pressure, static";
pub const COL_FLOW: &str = "Actual flow volume air/gas";
pub const COL_POWER: &str = "Rated power";
pub const COL_SPEED: &str = "Nominal rotation speed";
pub const COL_MANUFACTURER: &str = "Manufacturer";

/// Значения, которые считаются пропуском
const MISSING_TOKENS: &[&str] = &["", "nan", "na", "n/a", "null", "none", "<na>", "#n/a"];

/// Неизменяемый каталог: единственный источник данных для обучения и поиска
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
}

/// Статистика очистки
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub total: usize,
    pub missing_features: usize,
    pub missing_power: usize,
    pub out_of_range: usize,
}

impl CleaningStats {
    pub fn dropped(&self) -> usize {
        self.missing_features + self.missing_power + self.out_of_range
    }
}

struct ColumnIndex {
    pressure: usize,
    flow: usize,
    power: usize,
    speed: usize,
    manufacturer: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            pressure: require(COL_PRESSURE)?,
            flow: require(COL_FLOW)?,
            power: require(COL_POWER)?,
            speed: require(COL_SPEED)?,
            manufacturer: require(COL_MANUFACTURER)?,
        })
    }
}

impl Catalog {
    /// Каталог из уже очищенных строк (строки с нарушенным инвариантом отбрасываются)
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let rows = rows.into_iter().filter(row_is_valid).collect();
        Self { rows }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, CleaningStats), LoadError> {
        let path = path.as_ref();
        tracing::info!("Loading fan catalog from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, CleaningStats), LoadError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = ColumnIndex::from_headers(reader.headers()?)?;

        let mut stats = CleaningStats::default();
        let mut rows = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            stats.total += 1;
            // Номер строки в файле (заголовок — строка 1)
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(i + 2);
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            if [columns.pressure, columns.flow, columns.speed]
                .iter()
                .any(|&idx| is_missing(cell(idx)))
            {
                stats.missing_features += 1;
                continue;
            }

            let pressure = parse_numeric(cell(columns.pressure), line, COL_PRESSURE)?;
            let flow = parse_numeric(cell(columns.flow), line, COL_FLOW)?;
            let speed = parse_numeric(cell(columns.speed), line, COL_SPEED)?;
            if is_missing(cell(columns.power)) {
                stats.missing_power += 1;
                continue;
            }
            let rated_power = parse_numeric(cell(columns.power), line, COL_POWER)?;

            let row = CatalogRow {
                pressure,
                flow,
                speed,
                rated_power,
                manufacturer: cell(columns.manufacturer).trim().to_string(),
            };

            if !row_is_valid(&row) {
                stats.out_of_range += 1;
                continue;
            }
            rows.push(row);
        }

        if stats.dropped() > 0 {
            tracing::warn!(
                "Dropped {} of {} catalog rows ({} missing features, {} missing power, {} out of range)",
                stats.dropped(),
                stats.total,
                stats.missing_features,
                stats.missing_power,
                stats.out_of_range
            );
        }
        tracing::info!("Catalog loaded: {} rows", rows.len());

        Ok((Self { rows }, stats))
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Матрица признаков (давление, расход, скорость) в исходных единицах
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut features = Array2::zeros((self.rows.len(), N_FEATURES));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, value) in row.features().to_array().iter().enumerate() {
                features[[i, j]] = *value;
            }
        }
        features
    }

    pub fn power_targets(&self) -> Array1<f64> {
        self.rows.iter().map(|r| r.rated_power).collect()
    }

    pub fn manufacturers(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.manufacturer.as_str())
    }
}

fn row_is_valid(row: &CatalogRow) -> bool {
    [row.pressure, row.flow, row.speed, row.rated_power]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
}

fn is_missing(raw: &str) -> bool {
    let value = raw.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&value.as_str())
}

/// Разбор числа вида "1,250 W": убираем разделители тысяч и берём первый токен
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let stripped = raw.replace(',', "");
    let token = stripped.split_whitespace().next()?;
    token.parse::<f64>().ok()
}

fn parse_numeric(raw: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    clean_numeric(raw).ok_or_else(|| LoadError::InvalidNumber {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
