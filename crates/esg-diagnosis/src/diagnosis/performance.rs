use super::catalog::IndicatorCatalog;
use super::domain::PerformanceData;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum PerformanceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for PerformanceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceImportError::Io(err) => {
                write!(f, "failed to read performance export: {}", err)
            }
            PerformanceImportError::Csv(err) => {
                write!(f, "invalid performance CSV data: {}", err)
            }
        }
    }
}

impl std::error::Error for PerformanceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PerformanceImportError::Io(err) => Some(err),
            PerformanceImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PerformanceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PerformanceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Outcome of a bulk import: the assembled table plus any categories the
/// KPI catalog does not define. Unknown categories are kept in the data
/// and reported here so the caller can warn about them.
#[derive(Debug)]
pub struct PerformanceCsvImport {
    pub data: PerformanceData,
    pub unknown_categories: Vec<String>,
}

/// Bulk ingestion of `category,year,value` rows into the KPI table.
pub struct PerformanceCsvImporter;

impl PerformanceCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        catalog: &IndicatorCatalog,
    ) -> Result<PerformanceCsvImport, PerformanceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, catalog)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        catalog: &IndicatorCatalog,
    ) -> Result<PerformanceCsvImport, PerformanceImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut data = PerformanceData::new();
        let mut unknown_categories = Vec::new();

        for record in csv_reader.deserialize::<PerformanceRow>() {
            let row = record?;
            if row.value.is_empty() {
                continue;
            }
            if catalog.performance_category(&row.category).is_none()
                && !unknown_categories.contains(&row.category)
            {
                unknown_categories.push(row.category.clone());
            }
            data.entry(row.category)
                .or_default()
                .insert(row.year, row.value);
        }

        Ok(PerformanceCsvImport {
            data,
            unknown_categories,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PerformanceRow {
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Value", default)]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
Category,Year,Value
Energy consumption,2024,1250
Energy consumption,2023,1310
Waste recycled,2024, 18
Total employees,2024,42
Total employees,2023,
Night-shift ratio,2024,0.2
";

    #[test]
    fn rows_group_by_category_and_year() {
        let catalog = IndicatorCatalog::standard();
        let import = PerformanceCsvImporter::from_reader(Cursor::new(SAMPLE), &catalog)
            .expect("sample parses");

        assert_eq!(
            import.data["Energy consumption"]["2024"],
            "1250".to_string()
        );
        assert_eq!(import.data["Energy consumption"].len(), 2);
        assert_eq!(
            import.data["Waste recycled"]["2024"],
            "18".to_string(),
            "fields are trimmed"
        );
    }

    #[test]
    fn blank_values_are_skipped() {
        let catalog = IndicatorCatalog::standard();
        let import = PerformanceCsvImporter::from_reader(Cursor::new(SAMPLE), &catalog)
            .expect("sample parses");

        assert_eq!(import.data["Total employees"].len(), 1);
        assert!(!import.data["Total employees"].contains_key("2023"));
    }

    #[test]
    fn unknown_categories_are_kept_and_reported() {
        let catalog = IndicatorCatalog::standard();
        let import = PerformanceCsvImporter::from_reader(Cursor::new(SAMPLE), &catalog)
            .expect("sample parses");

        assert_eq!(import.unknown_categories, ["Night-shift ratio"]);
        assert!(import.data.contains_key("Night-shift ratio"));
    }

    #[test]
    fn malformed_csv_is_an_error() {
        let catalog = IndicatorCatalog::standard();
        let result = PerformanceCsvImporter::from_reader(
            Cursor::new("Category,Year,Value\n\"unterminated,2024,1"),
            &catalog,
        );

        assert!(result.is_err());
    }
}
