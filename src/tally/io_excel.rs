use calamine::{open_workbook, DataType, Reader, Xlsx};
use instant_runoff::RawPreference;
use log::debug;
use snafu::prelude::*;

use crate::tally::io_common::*;
use crate::tally::{EmptyExcelSnafu, MissingWorksheetSnafu, OpeningExcelSnafu, RcvResult};

/// Reads an Excel file laid out like the CSV files: a header row, then one ballot per row.
pub fn read_excel_ballots(path: &str, worksheet_name: Option<&str>) -> RcvResult<ParsedElection> {
    let default_id = make_default_id(path);
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu {
            path: path.to_string(),
        })?
        .iter()
        .map(|cell| match cell {
            DataType::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();
    debug!("read_excel_ballots: header: {:?}", header);
    let columns = header_columns(&header, path)?;

    let mut ballots = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        debug!("read_excel_ballots: lineno: {:?} row: {:?}", lineno, row);
        let voter = match row.first() {
            Some(DataType::Empty) | None => default_id(lineno),
            Some(cell) => cell.to_string().trim().to_string(),
        };
        let cells: Vec<RawPreference> = row.iter().skip(1).map(read_cell).collect();
        ballots.push(row_ballot(&voter, &columns, &cells));
    }
    check_unique_voters(&ballots, path)?;
    Ok(ParsedElection {
        candidates: column_candidates(&columns),
        ballots,
    })
}

/// Converts one cell to a preference. Text cells follow the same rules as CSV cells.
pub fn read_cell(cell: &DataType) -> RawPreference {
    match cell {
        DataType::Int(i) => RawPreference::Integer(*i),
        DataType::Float(f) => RawPreference::Float(*f),
        DataType::String(s) => parse_cell(s),
        DataType::Empty => RawPreference::Missing,
        other => RawPreference::Text(other.to_string()),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> RcvResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_ballots: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path.to_string(),
    })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook.worksheet_range(name).context(MissingWorksheetSnafu {
            path: path.to_string(),
            name: name.to_string(),
        })?
    } else {
        workbook.worksheet_range_at(0).context(EmptyExcelSnafu {
            path: path.to_string(),
        })?
    };
    wrange.context(OpeningExcelSnafu {
        path: path.to_string(),
    })
}
