//! Отчёт о подборе вентилятора
//!
//! Сборка данных отчёта из результата поиска, текстовый рендерер и
//! хранилище готовых файлов.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::ReportError;
use crate::types::{CatalogRow, FeatureVector, MatchResult, ReportRecord};

const HANDLE_PREFIX: &str = "fan_selection_report_";
/// Отчёт текстовый, хотя в ответе API поле называется `pdf_filename`
const HANDLE_EXTENSION: &str = "txt";
const PAGE_WIDTH: usize = 60;

/// Краткое описание найденного вентилятора
pub fn summary_text(row: &CatalogRow) -> String {
    format!(
        "Closest Match Details:\n\
         Manufacturer: {}\n\
         Pressure: {} Pa\n\
         Flow: {} m3/h\n\
         Speed: {} 1/min\n\
         Rated Power: {} kW",
        row.manufacturer, row.pressure, row.flow, row.speed, row.rated_power
    )
}

pub fn assemble(query: FeatureVector, matched: &MatchResult, generated_at: DateTime<Utc>) -> ReportRecord {
    ReportRecord {
        query,
        matched: matched.row.clone(),
        distance: matched.distance,
        summary: summary_text(&matched.row),
        generated_at,
    }
}

/// Имя артефакта выводится только из самой записи: время генерации и запрос
pub fn artifact_handle(record: &ReportRecord) -> String {
    let mut hasher = DefaultHasher::new();
    for value in record.query.to_array() {
        value.to_bits().hash(&mut hasher);
    }
    format!(
        "{}{}_{:016x}.{}",
        HANDLE_PREFIX,
        record.generated_at.format("%Y%m%d%H%M%S%3f"),
        hasher.finish(),
        HANDLE_EXTENSION
    )
}

/// Внешний рендерер документа отчёта
pub trait ReportRenderer: Send + Sync {
    fn render(&self, record: &ReportRecord) -> Result<Vec<u8>, ReportError>;
}

/// Отчёт в виде текстового документа с таблицами параметров
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl TextReportRenderer {
    fn section(out: &mut String, title: &str, rows: &[(&str, String)]) {
        out.push_str(title);
        out.push('\n');
        out.push_str(&"-".repeat(PAGE_WIDTH));
        out.push('\n');
        for (label, value) in rows {
            out.push_str(&format!("{:<28}{}\n", label, value));
        }
        out.push('\n');
    }
}

impl ReportRenderer for TextReportRenderer {
    fn render(&self, record: &ReportRecord) -> Result<Vec<u8>, ReportError> {
        let fan = &record.matched;
        let mut out = String::new();

        out.push_str(&"=".repeat(PAGE_WIDTH));
        out.push_str("\nFAN SELECTION REPORT\n");
        out.push_str(&"=".repeat(PAGE_WIDTH));
        out.push_str("\n\n");

        Self::section(
            &mut out,
            "SEARCH PARAMETERS",
            &[
                ("Rated Power", format!("{} kW", fan.rated_power)),
                ("Static Pressure", format!("{} Pa", record.query.pressure)),
                ("Flow Volume", format!("{} m³/h", record.query.flow)),
                ("Rotation Speed", format!("{} 1/min", record.query.speed)),
            ],
        );

        Self::section(
            &mut out,
            "SELECTED FAN DETAILS",
            &[
                ("Manufacturer", fan.manufacturer.clone()),
                ("Rated Power", format!("{} kW", fan.rated_power)),
                ("Rotation Speed", format!("{} 1/min", fan.speed)),
                ("Static Pressure", format!("{} Pa", fan.pressure)),
                ("Flow Volume", format!("{} m³/h", fan.flow)),
            ],
        );

        out.push_str(&format!(
            "Report generated on {}\n",
            record.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        Ok(out.into_bytes())
    }
}

/// Каталог с готовыми отчётами
pub struct ReportStore {
    dir: PathBuf,
    renderer: Box<dyn ReportRenderer>,
}

impl ReportStore {
    pub fn new<P: AsRef<Path>>(dir: P, renderer: Box<dyn ReportRenderer>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            renderer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Рендерит запись и сохраняет файл; возвращает его имя
    pub async fn store(&self, record: &ReportRecord) -> Result<String, ReportError> {
        let handle = artifact_handle(record);
        let bytes = self.renderer.render(record)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&handle), bytes).await?;
        tracing::info!("Report written: {}", handle);
        Ok(handle)
    }

    /// Путь к файлу; принимаются только простые имена файлов
    pub fn resolve(&self, handle: &str) -> Result<PathBuf, ReportError> {
        let is_plain_name = !handle.is_empty()
            && Path::new(handle).file_name().and_then(|n| n.to_str()) == Some(handle)
            && handle != "."
            && handle != "..";
        if !is_plain_name {
            return Err(ReportError::InvalidHandle(handle.to_string()));
        }
        Ok(self.dir.join(handle))
    }

    pub async fn read(&self, handle: &str) -> Result<Vec<u8>, ReportError> {
        let path = self.resolve(handle)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportError::NotFound(handle.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
