use crate::utils::ChartError;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_LIMIT: u32 = 100;
pub const USAGE: &str = "usage: spike-kline [symbol] [limit]";

/// Positional command-line arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub symbol: String,
    pub limit: u32,
}

impl Args {
    /// Parse `[symbol] [limit]`, program name already stripped
    pub fn parse<I, S>(args: I) -> Result<Self, ChartError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();

        if args.len() > 2 {
            return Err(ChartError::Usage(format!("too many arguments ({})\n{}", args.len(), USAGE)));
        }

        let symbol = match args.first() {
            Some(raw) => parse_symbol(raw)?,
            None => DEFAULT_SYMBOL.to_string(),
        };

        let limit = match args.get(1) {
            Some(raw) => parse_limit(raw)?,
            None => DEFAULT_LIMIT,
        };

        Ok(Self { symbol, limit })
    }
}

fn parse_symbol(raw: &str) -> Result<String, ChartError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(ChartError::Usage(format!("symbol must not be empty\n{}", USAGE)));
    }
    // The symbol becomes part of the output file name
    if symbol.contains(['/', '\\']) {
        return Err(ChartError::Usage(format!("symbol must not contain path separators: '{}'\n{}", symbol, USAGE)));
    }
    Ok(symbol.to_string())
}

fn parse_limit(raw: &str) -> Result<u32, ChartError> {
    match raw.trim().parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ChartError::Usage(format!("limit must be a positive integer, got '{}'\n{}", raw, USAGE))),
    }
}
