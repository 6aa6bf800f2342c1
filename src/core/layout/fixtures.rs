//! Small GDSII streams for tests.

use super::record::{data_type, record_type, Record, Stream};

pub(crate) struct GdsFixture {
    cells: Vec<(String, Vec<String>)>,
    labels: Vec<String>,
    padding: usize,
}

impl GdsFixture {
    /// One BOUNDARY per cell plus an SREF for every listed child.
    pub(crate) fn new(cells: &[(&str, &[&str])]) -> Self {
        Self {
            cells: cells
                .iter()
                .map(|(name, refs)| {
                    (
                        name.to_string(),
                        refs.iter().map(|r| r.to_string()).collect(),
                    )
                })
                .collect(),
            labels: Vec::new(),
            padding: 0,
        }
    }

    pub(crate) fn with_label(mut self, cell: &str) -> Self {
        self.labels.push(cell.to_string());
        self
    }

    pub(crate) fn with_padding(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut records = vec![
            int16(record_type::HEADER, &[600]),
            int16(record_type::BGNLIB, &[2024, 1, 1, 0, 0, 0, 2024, 1, 1, 0, 0, 0]),
            Record::ascii(record_type::LIBNAME, "fixture"),
            Record::new(
                record_type::UNITS,
                data_type::REAL8,
                vec![
                    0x3E, 0x41, 0x89, 0x37, 0x4B, 0xC6, 0xA7, 0xEF, 0x39, 0x44, 0xB8, 0x2F,
                    0xA0, 0x9B, 0x5A, 0x53,
                ],
            ),
        ];

        for (name, refs) in &self.cells {
            records.push(int16(
                record_type::BGNSTR,
                &[2024, 1, 1, 0, 0, 0, 2024, 1, 1, 0, 0, 0],
            ));
            records.push(Record::ascii(record_type::STRNAME, name));

            records.push(Record::new(record_type::BOUNDARY, data_type::NO_DATA, Vec::new()));
            records.push(int16(record_type::LAYER, &[68]));
            records.push(int16(record_type::DATATYPE, &[20]));
            records.push(int32(record_type::XY, &[0, 0, 100, 0, 100, 100, 0, 100, 0, 0]));
            records.push(endel());

            for (i, child) in refs.iter().enumerate() {
                records.push(Record::new(record_type::SREF, data_type::NO_DATA, Vec::new()));
                records.push(Record::ascii(record_type::SNAME, child));
                records.push(int32(record_type::XY, &[i as i32 * 200, 0]));
                records.push(endel());
            }

            if self.labels.contains(name) {
                records.push(Record::new(record_type::TEXT, data_type::NO_DATA, Vec::new()));
                records.push(int16(record_type::LAYER, &[68]));
                records.push(int16(record_type::TEXTTYPE, &[5]));
                records.push(int32(record_type::XY, &[50, 50]));
                records.push(Record::ascii(record_type::STRING, "VPWR"));
                records.push(endel());
            }

            records.push(Record::new(record_type::ENDSTR, data_type::NO_DATA, Vec::new()));
        }

        records.push(Record::new(record_type::ENDLIB, data_type::NO_DATA, Vec::new()));

        Stream {
            records,
            trailer: vec![0; self.padding],
        }
        .to_bytes()
    }
}

pub(crate) fn gds(cells: &[(&str, &[&str])]) -> Vec<u8> {
    GdsFixture::new(cells).build()
}

fn endel() -> Record {
    Record::new(record_type::ENDEL, data_type::NO_DATA, Vec::new())
}

fn int16(rtype: u8, values: &[i16]) -> Record {
    Record::new(
        rtype,
        data_type::INT16,
        values.iter().flat_map(|v| v.to_be_bytes()).collect(),
    )
}

fn int32(rtype: u8, values: &[i32]) -> Record {
    Record::new(
        rtype,
        data_type::INT32,
        values.iter().flat_map(|v| v.to_be_bytes()).collect(),
    )
}
