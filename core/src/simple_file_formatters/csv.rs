use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum ReadCsvError {
    #[error("Could not open csv file {0}: {1}")]
    CouldNotOpenFile(PathBuf, csv::Error),

    #[error("Could not parse csv file {0}: {1}")]
    CouldNotParseFile(PathBuf, csv::Error),
}

/// Reads every row of a headered csv file into `T`.
///
/// Fields are matched to `T` by header name, so the column order in the file does not matter
/// and extra columns are ignored. The first malformed row fails the whole file.
pub fn read_csv_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ReadCsvError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| ReadCsvError::CouldNotOpenFile(path.to_path_buf(), e))?;

    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| ReadCsvError::CouldNotParseFile(path.to_path_buf(), e))?;

    debug!("Read {} records from {}", records.len(), path.display());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::records::{Instrument, Price, Trade};

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_instruments() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "instruments.csv",
            "instrument_id,sector_name,country_name,index_name,instrument_type\n\
             1,Tech,US,NASDAQ,equity\n\
             2,Energy,GB,FTSE, equity \n",
        );

        let instruments: Vec<Instrument> = read_csv_records(&path).unwrap();

        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[0].instrument_id, 1);
        assert_eq!(instruments[0].index_name, "NASDAQ");
        assert_eq!(instruments[1].instrument_type, "equity");
    }

    #[test]
    fn test_columns_are_matched_by_header_name() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "prices.csv",
            "instrument_id,unused,price,date\n7,x,12.5,2020-01-02\n",
        );

        let prices: Vec<Price> = read_csv_records(&path).unwrap();

        assert_eq!(
            prices,
            vec![Price { date: "2020-01-02".to_string(), price: 12.5, instrument_id: 7 }]
        );
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "prices.csv", "date,price,instrument_id\n");

        let prices: Vec<Price> = read_csv_records(&path).unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn test_malformed_field_fails_the_file() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "trades.csv",
            "customer_id,execution_time,direction,execution_size,execution_price,instrument_id\n\
             1,2020-01-02 10:00:00,buy,10,100.5,3\n\
             2,2020-01-02 10:00:01,sell,ten,100.5,3\n",
        );

        let result: Result<Vec<Trade>, _> = read_csv_records(&path);
        assert!(matches!(result, Err(ReadCsvError::CouldNotParseFile(_, _))));
    }

    #[test]
    fn test_missing_column_fails_the_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "prices.csv", "date,price\n2020-01-02,1.0\n");

        let result: Result<Vec<Price>, _> = read_csv_records(&path);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("prices.csv"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result: Result<Vec<Price>, _> = read_csv_records(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(ReadCsvError::CouldNotOpenFile(_, _))));
    }
}
