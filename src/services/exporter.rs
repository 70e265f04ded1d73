//! CSV export of the error frequency table

use crate::models::log::ErrorRecord;

pub const CSV_HEADER: [&str; 2] = ["Type & Description", "Count"];

/// Serialize `records` as CSV with CRLF line endings, in the given order.
///
/// An empty table yields the header row only.
pub fn to_csv(records: &[ErrorRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([record.key(), record.count.to_string()])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}
