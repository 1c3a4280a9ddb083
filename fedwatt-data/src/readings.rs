//! Household readings ingestion
//!
//! The input CSV packs parallel lists into single cells: each row covers
//! one home, and the `Time`, `Appliance Type`, `Energy Consumption`,
//! `Outdoor Temperature`, and `Household Size` cells hold comma-joined
//! lists of per-reading values. Parsing explodes every row into
//! individual appliance readings by zipping those lists positionally;
//! the shortest list bounds the zip.
//!
//! Malformed entries (unparseable hour or numeric field) are dropped
//! with a summary warning rather than failing the whole file. Empty
//! numeric cells read as zero.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::DataError;

/// One appliance reading after explosion
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceReading {
    /// Household identifier
    pub home_id: String,
    /// Hour of day, extracted from the HH:MM time field
    pub hour: u8,
    /// Appliance name as it appears in the data
    pub appliance: String,
    /// Energy drawn during the reading, kWh
    pub energy_kwh: f32,
    /// Outdoor temperature at reading time, degrees Celsius
    pub outdoor_temp_c: f32,
    /// Number of occupants
    pub household_size: f32,
}

/// Resolved column positions in the header row
struct ColumnMap {
    home: usize,
    time: usize,
    appliance: usize,
    energy: usize,
    temperature: usize,
    size: usize,
}

/// Loads and explodes a readings CSV from disk.
///
/// # Errors
/// Returns `DataError::ReadFailed` if the file cannot be read, plus any
/// error from [`parse_readings`].
pub fn load_readings<P: AsRef<Path>>(path: P) -> Result<Vec<ApplianceReading>, DataError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| DataError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loading household readings");
    parse_readings(&text)
}

/// Parses and explodes readings from CSV text.
///
/// # Errors
/// Returns `DataError::EmptyInput` for an empty file,
/// `DataError::MissingColumn` if a required header is absent, and
/// `DataError::NoUsableReadings` if nothing parseable remains.
pub fn parse_readings(text: &str) -> Result<Vec<ApplianceReading>, DataError> {
    let mut lines = text.lines();
    let header_line = lines.next().ok_or(DataError::EmptyInput)?;
    let header = split_csv_line(header_line);
    let columns = resolve_columns(&header)?;

    let mut readings = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_csv_line(line);

        let home_id = match cells.get(columns.home).map(|c| c.trim()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let times = list_cell(&cells, columns.time);
        let appliances = list_cell(&cells, columns.appliance);
        let energies = list_cell(&cells, columns.energy);
        let temperatures = list_cell(&cells, columns.temperature);
        let sizes = list_cell(&cells, columns.size);

        let entries = times
            .len()
            .min(appliances.len())
            .min(energies.len())
            .min(temperatures.len())
            .min(sizes.len());

        for i in 0..entries {
            match build_reading(
                &home_id,
                &times[i],
                &appliances[i],
                &energies[i],
                &temperatures[i],
                &sizes[i],
            ) {
                Some(reading) => readings.push(reading),
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "dropped malformed readings");
    }
    if readings.is_empty() {
        return Err(DataError::NoUsableReadings);
    }
    debug!(count = readings.len(), "parsed readings");
    Ok(readings)
}

fn resolve_columns(header: &[String]) -> Result<ColumnMap, DataError> {
    Ok(ColumnMap {
        home: column_index(header, "Home ID")?,
        time: column_index(header, "Time")?,
        appliance: column_index(header, "Appliance Type")?,
        // Unit suffixes on these two vary between exports, so match on
        // the stable prefix
        energy: column_index_by_prefix(header, "Energy Consumption")?,
        temperature: column_index_by_prefix(header, "Outdoor Temperature")?,
        size: column_index(header, "Household Size")?,
    })
}

fn column_index(header: &[String], name: &str) -> Result<usize, DataError> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn {
            name: name.to_string(),
        })
}

fn column_index_by_prefix(header: &[String], prefix: &str) -> Result<usize, DataError> {
    header
        .iter()
        .position(|h| h.trim().starts_with(prefix))
        .ok_or_else(|| DataError::MissingColumn {
            name: prefix.to_string(),
        })
}

/// Splits a list-valued cell into trimmed entries
fn list_cell(cells: &[String], index: usize) -> Vec<String> {
    cells
        .get(index)
        .map(|cell| cell.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default()
}

fn build_reading(
    home_id: &str,
    time: &str,
    appliance: &str,
    energy: &str,
    temperature: &str,
    size: &str,
) -> Option<ApplianceReading> {
    if appliance.is_empty() {
        return None;
    }
    let hour: u8 = time.split(':').next()?.trim().parse().ok()?;
    Some(ApplianceReading {
        home_id: home_id.to_string(),
        hour,
        appliance: appliance.to_string(),
        energy_kwh: numeric_or_zero(energy)?,
        outdoor_temp_c: numeric_or_zero(temperature)?,
        household_size: numeric_or_zero(size)?,
    })
}

/// Empty cells read as zero; anything else must parse as a number
fn numeric_or_zero(cell: &str) -> Option<f32> {
    if cell.is_empty() {
        Some(0.0)
    } else {
        cell.parse().ok()
    }
}

/// Splits one CSV line, honoring double-quoted cells and `""` escapes
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Home ID,Time,Appliance Type,Energy Consumption (kWh),Outdoor Temperature (C),Household Size";

    fn make_test_csv() -> String {
        format!(
            "{HEADER}\n\
             H1,\"07:00, 07:00, 18:30\",\"Fridge, TV, Fridge\",\"0.5, 0.2, 0.6\",\"21.5, 21.5, 18.0\",\"3, 3, 3\"\n\
             H2,\"07:00\",\"Heater\",\"1.4\",\"5.0\",\"2\"\n"
        )
    }

    #[test]
    fn test_parse_explodes_packed_rows() {
        let readings = parse_readings(&make_test_csv()).unwrap();
        assert_eq!(readings.len(), 4);

        assert_eq!(
            readings[0],
            ApplianceReading {
                home_id: String::from("H1"),
                hour: 7,
                appliance: String::from("Fridge"),
                energy_kwh: 0.5,
                outdoor_temp_c: 21.5,
                household_size: 3.0,
            }
        );
        assert_eq!(readings[2].hour, 18);
        assert_eq!(readings[3].home_id, "H2");
    }

    #[test]
    fn test_empty_numeric_cells_read_as_zero() {
        let csv = format!("{HEADER}\nH1,\"07:00, 08:00\",\"TV, TV\",\"0.2,\",\", 20.0\",\"2, 2\"\n");
        let readings = parse_readings(&csv).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].energy_kwh, 0.0);
        assert_eq!(readings[0].outdoor_temp_c, 0.0);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let csv = format!(
            "{HEADER}\nH1,\"07:00, bad, 09:00\",\"TV, TV, TV\",\"0.2, 0.3, oops\",\"20, 20, 20\",\"2, 2, 2\"\n"
        );
        // Entry 2 has a bad hour, entry 3 a bad energy value
        let readings = parse_readings(&csv).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].hour, 7);
    }

    #[test]
    fn test_shortest_list_bounds_the_zip() {
        let csv = format!("{HEADER}\nH1,\"07:00, 08:00, 09:00\",\"TV, TV\",\"0.2, 0.3, 0.4\",\"20, 20\",\"2, 2\"\n");
        let readings = parse_readings(&csv).unwrap();
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = parse_readings("Home ID,Time\nH1,07:00\n").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn test_header_only_yields_no_usable_readings() {
        let err = parse_readings(&format!("{HEADER}\n")).unwrap_err();
        assert!(matches!(err, DataError::NoUsableReadings));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_readings(""), Err(DataError::EmptyInput)));
    }

    #[test]
    fn test_quoted_cell_with_escaped_quote() {
        let fields = split_csv_line("a,\"b,\"\"c\"\"\",d");
        assert_eq!(fields, vec!["a", "b,\"c\"", "d"]);
    }

    #[test]
    fn test_load_readings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", make_test_csv()).unwrap();

        let readings = load_readings(&path).unwrap();
        assert_eq!(readings.len(), 4);
    }

    #[test]
    fn test_load_readings_missing_file() {
        let err = load_readings("/nonexistent/readings.csv").unwrap_err();
        assert!(matches!(err, DataError::ReadFailed { .. }));
    }
}
