// Candle loading from CSV exports. Two layouts are recognised from the header:
// the comma-separated standard layout and the semicolon Brazilian-exchange export.
use crate::error::EngineError;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::Candle;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

// Localized number and date handling for the Brazilian layout
pub mod brazilian_format {
    use anyhow::{anyhow, Result};
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

    // "1.234,56" -> 1234.56; '.' groups thousands, ',' is the decimal mark
    pub fn parse_decimal(s: &str) -> Result<f64> {
        let normalized = s.trim().replace('.', "").replace(',', ".");
        normalized
            .parse::<f64>()
            .map_err(|e| anyhow!("Failed to parse decimal '{}': {}", s, e))
    }

    // "24.228" -> 24228
    pub fn parse_count(s: &str) -> Result<u32> {
        s.trim()
            .replace('.', "")
            .parse::<u32>()
            .map_err(|e| anyhow!("Failed to parse count '{}': {}", s, e))
    }

    // "dd/mm/yyyy" + "HH:MM:SS", taken as UTC
    pub fn parse_datetime(date_str: &str, time_str: &str) -> Result<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(date_str.trim(), "%d/%m/%Y")
            .map_err(|e| anyhow!("Failed to parse date '{}': {}", date_str, e))?;
        let time = NaiveTime::parse_from_str(time_str.trim(), "%H:%M:%S")
            .map_err(|e| anyhow!("Failed to parse time '{}': {}", time_str, e))?;
        Ok(DateTime::from_naive_utc_and_offset(date.and_time(time), Utc))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{Datelike, Timelike};

        #[test]
        fn test_parse_decimal_with_thousands() {
            assert_eq!(parse_decimal("123,45").unwrap(), 123.45);
            assert_eq!(parse_decimal("1.234,56").unwrap(), 1234.56);
            assert_eq!(parse_decimal("600.822.115,84").unwrap(), 600822115.84);
            assert!(parse_decimal("abc").is_err());
        }

        #[test]
        fn test_parse_count() {
            assert_eq!(parse_count("24.228").unwrap(), 24228);
            assert!(parse_count("-1").is_err());
        }

        #[test]
        fn test_parse_datetime_valid() {
            let dt = parse_datetime("30/12/2024", "18:20:00").unwrap();
            assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 12, 30));
            assert_eq!((dt.hour(), dt.minute(), dt.second()), (18, 20, 0));
        }

        #[test]
        fn test_parse_datetime_invalid() {
            assert!(parse_datetime("32/12/2024", "18:20:00").is_err());
            assert!(parse_datetime("30/12/2024", "25:20:00").is_err());
            assert!(parse_datetime("2024/12/30", "18:20:00").is_err());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// `timestamp,open,high,low,close,volume[,trades]`
    Standard,
    /// `Ativo;Data;Hora;Abertura;Máximo;Mínimo;Fechamento;Volume;Quantidade`
    Brazilian,
}

impl CsvLayout {
    pub fn detect(header_line: &str) -> Self {
        if header_line.contains(';') {
            CsvLayout::Brazilian
        } else {
            CsvLayout::Standard
        }
    }
}

fn field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
        .and_then(|pos| record.get(pos))
        .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", name, line))
}

fn optional_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
        .and_then(|pos| record.get(pos))
}

pub struct BrazilianCsvParser;

impl BrazilianCsvParser {
    // Example row: WINFUT;30/12/2024;18:20:00;124.080;124.090;123.938;123.983;600.822.115,84;24.228
    pub fn parse<R: Read>(reader: R, default_symbol: &str) -> Result<Vec<Candle>> {
        let mut rdr = ReaderBuilder::new().delimiter(b';').has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut candles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;
            let decimal = |name: &str| -> Result<f64> {
                brazilian_format::parse_decimal(field(&record, &headers, name, line)?)
                    .with_context(|| format!("Error parsing '{}' at line {}", name, line))
            };

            let symbol = optional_field(&record, &headers, "Ativo")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default_symbol);
            let timestamp = brazilian_format::parse_datetime(
                field(&record, &headers, "Data", line)?,
                field(&record, &headers, "Hora", line)?,
            )
            .with_context(|| format!("Error parsing datetime at line {}", line))?;
            let trades = brazilian_format::parse_count(field(&record, &headers, "Quantidade", line)?)
                .with_context(|| format!("Error parsing 'Quantidade' at line {}", line))?;

            candles.push(Candle {
                symbol: symbol.trim().to_string(),
                timestamp,
                open: decimal("Abertura")?,
                high: decimal("Máximo")?,
                low: decimal("Mínimo")?,
                close: decimal("Fechamento")?,
                volume: decimal("Volume")?,
                trades,
            });
        }
        Ok(candles)
    }
}

pub struct StandardCsvParser;

impl StandardCsvParser {
    /// RFC 3339 or epoch milliseconds.
    pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(millis) = raw.parse::<i64>() {
            return DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| anyhow!("Timestamp '{}' is out of range", raw));
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow!("Failed to parse timestamp '{}': {}", raw, e))
    }

    pub fn parse<R: Read>(reader: R, symbol: &str) -> Result<Vec<Candle>> {
        let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut candles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;
            let number = |name: &str| -> Result<f64> {
                let raw = field(&record, &headers, name, line)?;
                raw.parse::<f64>()
                    .map_err(|e| anyhow!("Error parsing '{}' at line {}: {}", name, line, e))
            };
            let trades = match optional_field(&record, &headers, "trades") {
                Some(raw) if !raw.is_empty() => raw
                    .parse::<u32>()
                    .map_err(|e| anyhow!("Error parsing 'trades' at line {}: {}", line, e))?,
                _ => 0,
            };

            candles.push(Candle {
                symbol: symbol.to_string(),
                timestamp: Self::parse_timestamp(field(&record, &headers, "timestamp", line)?)
                    .with_context(|| format!("Error parsing 'timestamp' at line {}", line))?,
                open: number("open")?,
                high: number("high")?,
                low: number("low")?,
                close: number("close")?,
                volume: number("volume")?,
                trades,
            });
        }
        Ok(candles)
    }
}

/// Loads candles from `path`, picking the layout from the header line.
pub fn load_candles_from_path(path: impl AsRef<Path>, symbol: &str) -> Result<Vec<Candle>, EngineError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let layout = {
        let head = reader.fill_buf()?;
        let first_line = String::from_utf8_lossy(head);
        CsvLayout::detect(first_line.lines().next().unwrap_or_default())
    };

    let parsed = match layout {
        CsvLayout::Brazilian => BrazilianCsvParser::parse(reader, symbol),
        CsvLayout::Standard => StandardCsvParser::parse(reader, symbol),
    };
    let candles = parsed.map_err(|e| EngineError::CsvDataFormatError(format!("{}: {:#}", path.display(), e)))?;
    tracing::info!(path = %path.display(), ?layout, count = candles.len(), "Loaded candles from CSV");
    Ok(candles)
}
