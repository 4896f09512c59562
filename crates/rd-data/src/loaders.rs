use std::io;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use rd_types::{DataError, FxTable, Position, RdResult, Side};
use rust_decimal::Decimal;

/// Cell values treated as missing, matching what spreadsheet and dataframe
/// exports commonly write for empty cells.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A",
];

fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

/// Column positions in a positions file
#[derive(Debug, Clone, Copy)]
struct PositionColumns {
    ticker: usize,
    name: usize,
    country: usize,
    sector: usize,
    currency: usize,
    shares: usize,
    market_price: usize,
    cost_basis: usize,
    beta: usize,
    avg_daily_volume: usize,
    side: Option<usize>,
}

/// Column positions in an FX file
#[derive(Debug, Clone, Copy)]
struct FxColumns {
    currency: usize,
    to_usd: usize,
}

/// Loader for the comma-separated positions and FX inputs.
///
/// Columns are located by header name, so any column order is accepted and
/// unrecognised columns are ignored.
#[derive(Debug, Default)]
pub struct CsvLoader;

impl CsvLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load positions from a CSV file with a header row
    pub fn load_positions<P: AsRef<Path>>(&self, file_path: P) -> RdResult<Vec<Position>> {
        let path = file_path.as_ref();
        tracing::info!("Loading positions from: {}", path.display());

        let file = Self::open(path)?;
        let positions = self.read_positions(file, &path.display().to_string())?;

        tracing::info!("Loaded {} positions from {}", positions.len(), path.display());
        Ok(positions)
    }

    /// Load FX rates from a CSV file with a header row
    pub fn load_fx_rates<P: AsRef<Path>>(&self, file_path: P) -> RdResult<FxTable> {
        let path = file_path.as_ref();
        tracing::info!("Loading FX rates from: {}", path.display());

        let file = Self::open(path)?;
        let fx = self.read_fx_rates(file, &path.display().to_string())?;

        tracing::info!("Loaded {} FX rates from {}", fx.len(), path.display());
        Ok(fx)
    }

    fn open(path: &Path) -> RdResult<std::fs::File> {
        if !path.exists() {
            return Err(DataError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        std::fs::File::open(path).map_err(|e| {
            DataError::LoadingFailed {
                message: format!("Failed to open {}: {}", path.display(), e),
            }
            .into()
        })
    }

    /// Parse positions from any reader; `source_name` labels error messages.
    pub fn read_positions<R: io::Read>(&self, reader: R, source_name: &str) -> RdResult<Vec<Position>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers from {}: {}", source_name, e),
            })?
            .clone();
        tracing::debug!("Positions headers: {:?}", headers);

        let columns = self.detect_position_columns(&headers, source_name)?;

        let mut positions = Vec::new();
        for (line_num, result) in rdr.records().enumerate() {
            let line = line_num + 2;
            let record = result.map_err(|e| DataError::ParseError {
                message: format!("Failed to read {} record at line {}: {}", source_name, line, e),
            })?;

            let position = self.parse_position_record(&record, &columns).map_err(|e| {
                DataError::ParseError {
                    message: format!("{} line {}: {}", source_name, line, e),
                }
            })?;
            positions.push(position);
        }

        Ok(positions)
    }

    /// Parse FX rates from any reader; `source_name` labels error messages.
    pub fn read_fx_rates<R: io::Read>(&self, reader: R, source_name: &str) -> RdResult<FxTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers from {}: {}", source_name, e),
            })?
            .clone();

        let columns = self.detect_fx_columns(&headers, source_name)?;

        let mut fx = FxTable::new();
        for (line_num, result) in rdr.records().enumerate() {
            let line = line_num + 2;
            let record = result.map_err(|e| DataError::ParseError {
                message: format!("Failed to read {} record at line {}: {}", source_name, line, e),
            })?;

            let currency = Self::required_text(&record, columns.currency, "currency").map_err(|e| {
                DataError::ParseError {
                    message: format!("{} line {}: {}", source_name, line, e),
                }
            })?;
            let to_usd = Self::parse_decimal(record.get(columns.to_usd).unwrap_or(""), "to_USD")
                .map_err(|e| DataError::ParseError {
                    message: format!("{} line {}: {}", source_name, line, e),
                })?;

            if let Some(previous) = fx.insert(&currency, to_usd) {
                tracing::warn!(
                    currency = %currency,
                    previous = %previous,
                    rate = %to_usd,
                    "Duplicate FX rate, keeping the later row"
                );
            }
        }

        Ok(fx)
    }

    fn parse_position_record(
        &self,
        record: &StringRecord,
        columns: &PositionColumns,
    ) -> Result<Position, String> {
        let ticker = Self::required_text(record, columns.ticker, "ticker")?;
        let currency = record
            .get(columns.currency)
            .filter(|v| !is_missing(v))
            .map(|v| v.to_string());

        let position = Position {
            name: Self::required_text(record, columns.name, "name")?,
            country: Self::required_text(record, columns.country, "country")?,
            sector: Self::required_text(record, columns.sector, "sector")?,
            currency,
            shares: Self::parse_decimal(record.get(columns.shares).unwrap_or(""), "posn_shares")?,
            market_price_local: Self::parse_decimal(
                record.get(columns.market_price).unwrap_or(""),
                "market_price_local",
            )?,
            cost_basis_local: Self::parse_decimal(
                record.get(columns.cost_basis).unwrap_or(""),
                "cost_basis_local",
            )?,
            beta: Self::parse_decimal(record.get(columns.beta).unwrap_or(""), "beta")?,
            avg_daily_volume: Self::parse_decimal(
                record.get(columns.avg_daily_volume).unwrap_or(""),
                "avg_daily_volume",
            )?,
            ticker,
        };

        if position.avg_daily_volume < Decimal::ZERO {
            return Err(format!(
                "negative avg_daily_volume {} for {}",
                position.avg_daily_volume, position.ticker
            ));
        }

        // The side column is optional; the sign of the share count is authoritative.
        if let Some(side_idx) = columns.side {
            let raw = record.get(side_idx).unwrap_or("");
            if !is_missing(raw) {
                let supplied = Side::from_str(raw)?;
                if supplied != position.side() {
                    tracing::warn!(
                        ticker = %position.ticker,
                        supplied = %supplied,
                        shares = %position.shares,
                        "Supplied side disagrees with share sign, using {}",
                        position.side()
                    );
                }
            }
        }

        Ok(position)
    }

    fn detect_position_columns(
        &self,
        headers: &StringRecord,
        source_name: &str,
    ) -> RdResult<PositionColumns> {
        let find = |name: &str| Self::find_column(headers, name, source_name);

        Ok(PositionColumns {
            ticker: find("ticker")?,
            name: find("name")?,
            country: find("country")?,
            sector: find("sector")?,
            currency: find("currency")?,
            shares: find("posn_shares")?,
            market_price: find("market_price_local")?,
            cost_basis: find("cost_basis_local")?,
            beta: find("beta")?,
            avg_daily_volume: find("avg_daily_volume")?,
            side: Self::column_index(headers, "side"),
        })
    }

    fn detect_fx_columns(&self, headers: &StringRecord, source_name: &str) -> RdResult<FxColumns> {
        for header in headers.iter() {
            if Self::is_unnamed(header) {
                tracing::debug!("Dropping unnamed FX column {:?}", header);
            }
        }

        Ok(FxColumns {
            currency: Self::find_column(headers, "currency", source_name)?,
            to_usd: Self::find_column(headers, "to_USD", source_name)?,
        })
    }

    /// Export artefacts such as a blank header or pandas' `Unnamed: 0`.
    fn is_unnamed(header: &str) -> bool {
        let header = header.trim();
        header.is_empty() || header.starts_with("Unnamed")
    }

    fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| !Self::is_unnamed(h) && h.trim().eq_ignore_ascii_case(name))
    }

    fn find_column(headers: &StringRecord, name: &str, source_name: &str) -> RdResult<usize> {
        Self::column_index(headers, name).ok_or_else(|| {
            DataError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            }
            .into()
        })
    }

    fn required_text(record: &StringRecord, idx: usize, field_name: &str) -> Result<String, String> {
        match record.get(idx) {
            Some(value) if !is_missing(value) => Ok(value.to_string()),
            _ => Err(format!("Empty value for field: {}", field_name)),
        }
    }

    /// Parse a decimal value, accepting plain and scientific notation
    fn parse_decimal(value_str: &str, field_name: &str) -> Result<Decimal, String> {
        if is_missing(value_str) {
            return Err(format!("Empty value for field: {}", field_name));
        }

        Decimal::from_str(value_str)
            .or_else(|_| Decimal::from_scientific(value_str))
            .map_err(|e| format!("Could not parse {} value '{}': {}", field_name, value_str, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_types::RdError;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const POSITIONS_HEADER: &str = "ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,beta,avg_daily_volume,side";

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_positions_from_file() {
        let csv = format!(
            "{}\nAAA,Alpha Corp,USA,Tech,USD,1000,10,8,1.0,50000,LONG\nBBB,Beta AG,GER,Industrials,EUR,-500,20,22,-1.5,20000,SHORT\n",
            POSITIONS_HEADER
        );
        let file = write_temp(&csv);

        let positions = CsvLoader::new().load_positions(file.path()).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].ticker, "AAA");
        assert_eq!(positions[0].shares, dec!(1000));
        assert_eq!(positions[1].currency.as_deref(), Some("EUR"));
        assert_eq!(positions[1].side(), Side::Short);
        assert_eq!(positions[1].beta, dec!(-1.5));
    }

    #[test]
    fn test_arbitrary_column_order_and_missing_currency() {
        let csv = "beta,avg_daily_volume,posn_shares,ticker,currency,name,sector,country,market_price_local,cost_basis_local\n\
                   0.5,1e6,200,CCC,,Gamma KK,Autos,JPN,50,45\n";
        let positions = CsvLoader::new().read_positions(csv.as_bytes(), "positions").unwrap();

        let p = &positions[0];
        assert_eq!(p.ticker, "CCC");
        assert_eq!(p.currency, None);
        assert_eq!(p.country, "JPN");
        assert_eq!(p.avg_daily_volume, dec!(1000000));
        assert_eq!(p.side(), Side::Long);
    }

    #[test]
    fn test_missing_value_tokens() {
        for token in ["NaN", "nan", "NA", "null", "None"] {
            let csv = format!(
                "ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,beta,avg_daily_volume\n\
                 DDD,Delta,GBR,Energy,{},10,1,1,1,100\n",
                token
            );
            let positions = CsvLoader::new().read_positions(csv.as_bytes(), "positions").unwrap();
            assert_eq!(positions[0].currency, None, "token {}", token);
        }
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "ticker,name,country,sector,currency,posn_shares,market_price_local,cost_basis_local,avg_daily_volume\n";
        let err = CsvLoader::new().read_positions(csv.as_bytes(), "positions").unwrap_err();

        match err {
            RdError::Data(DataError::MissingColumn { column, .. }) => assert_eq!(column, "beta"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_value_is_malformed_input() {
        let csv = format!(
            "{}\nAAA,Alpha,USA,Tech,USD,lots,10,8,1.0,50000,LONG\n",
            POSITIONS_HEADER
        );
        let err = CsvLoader::new().read_positions(csv.as_bytes(), "positions").unwrap_err();

        match err {
            RdError::Data(e) => {
                assert!(e.is_malformed_input());
                assert!(e.to_string().contains("line 2"));
                assert!(e.to_string().contains("posn_shares"));
            }
            other => panic!("Expected data error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_side_is_rejected() {
        let csv = format!("{}\nAAA,Alpha,USA,Tech,USD,10,10,8,1.0,50000,FLAT\n", POSITIONS_HEADER);
        assert!(CsvLoader::new().read_positions(csv.as_bytes(), "positions").is_err());
    }

    #[test]
    fn test_mismatched_side_uses_share_sign() {
        let csv = format!("{}\nAAA,Alpha,USA,Tech,USD,-10,10,8,1.0,50000,LONG\n", POSITIONS_HEADER);
        let positions = CsvLoader::new().read_positions(csv.as_bytes(), "positions").unwrap();
        assert_eq!(positions[0].side(), Side::Short);
    }

    #[test]
    fn test_load_fx_drops_unnamed_columns() {
        let file = write_temp(",currency,to_USD,Unnamed: 3\n0,USD,1.0,x\n1,EUR,1.10,y\n2,JPY,0.0067,z\n");

        let fx = CsvLoader::new().load_fx_rates(file.path()).unwrap();
        assert_eq!(fx.len(), 3);
        assert_eq!(fx.rate("EUR"), Some(dec!(1.10)));
        assert_eq!(fx.rate("JPY"), Some(dec!(0.0067)));
    }

    #[test]
    fn test_fx_duplicate_keeps_last() {
        let csv = "currency,to_USD\nEUR,1.10\nEUR,1.12\n";
        let fx = CsvLoader::new().read_fx_rates(csv.as_bytes(), "fx").unwrap();
        assert_eq!(fx.rate("EUR"), Some(dec!(1.12)));
    }

    #[test]
    fn test_fx_missing_rate_column() {
        let csv = "Unnamed: 0,currency,rate\n0,EUR,1.1\n";
        let err = CsvLoader::new().read_fx_rates(csv.as_bytes(), "fx").unwrap_err();
        assert!(matches!(
            err,
            RdError::Data(DataError::MissingColumn { ref column, .. }) if column == "to_USD"
        ));
    }

    #[test]
    fn test_file_not_found() {
        let err = CsvLoader::new()
            .load_positions("/definitely/not/here/positions.csv")
            .unwrap_err();

        match err {
            RdError::Data(DataError::FileNotFound { path }) => assert!(path.contains("positions.csv")),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }
}
