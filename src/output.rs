//! Output sink shared by the commands: a table for people, JSON lines
//! or CSV for machines.

use std::io::Write as _;
use std::path::PathBuf;

use csv_core::WriteResult;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Format {
    Table,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    /// Write the results to this file instead of the standard output.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize the record to JSON")]
    SerializeJson(#[source] serde_json::Error),
}

impl Args {
    pub fn into_output(self) -> Result<Output, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        let shape = match &self.format {
            Format::Table => {
                let mut table = comfy_table::Table::new();
                table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Shape::Table(table)
            }
            Format::Jsonl => Shape::Jsonl,
            Format::Csv => Shape::Csv,
        };
        Ok(Output { args: self, io, shape })
    }
}

pub struct Output {
    args: Args,
    io: Box<dyn std::io::Write>,
    shape: Shape,
}

enum Shape {
    Table(comfy_table::Table),
    Jsonl,
    Csv,
}

impl Output {
    /// Column names for the table and CSV shapes. Must be the first
    /// call on a fresh output.
    pub fn headers(&mut self, names: Vec<&'static str>) -> Result<(), Error> {
        match &mut self.shape {
            Shape::Table(table) => {
                table.set_header(names);
            }
            Shape::Jsonl => {}
            Shape::Csv => self.csv_row(&names)?,
        }
        Ok(())
    }

    /// Emit one result. The cell form feeds the table/CSV shapes, the
    /// record form the JSON lines shape; only the one that is needed
    /// gets built.
    pub fn result<R: serde::Serialize>(
        &mut self,
        cells: impl FnOnce() -> Vec<String>,
        record: impl FnOnce() -> R,
    ) -> Result<(), Error> {
        match &mut self.shape {
            Shape::Table(table) => {
                table.add_row(cells());
            }
            Shape::Jsonl => {
                serde_json::to_writer(&mut self.io, &record()).map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?;
            }
            Shape::Csv => self.csv_row(&cells())?,
        }
        Ok(())
    }

    fn csv_row<V: std::ops::Deref<Target = str>>(&mut self, cells: &[V]) -> Result<(), Error> {
        // Worst case every byte gets escaped into two, plus the quotes.
        let longest = cells.iter().map(|v| v.len()).max().unwrap_or(0);
        let mut buf = vec![0; 2 * longest + 2];
        let mut writer = csv_core::Writer::new();
        for cell in cells {
            let (WriteResult::InputEmpty, consumed, produced) =
                writer.field(cell.as_bytes(), &mut buf)
            else {
                panic!("csv field did not fit the escape buffer");
            };
            assert_eq!(consumed, cell.len());
            self.io.write_all(&buf[..produced]).map_err(|e| self.write_error(e))?;
            let (WriteResult::InputEmpty, produced) = writer.delimiter(&mut buf) else {
                panic!("csv delimiter did not fit the escape buffer");
            };
            self.io.write_all(&buf[..produced]).map_err(|e| self.write_error(e))?;
        }
        let (WriteResult::InputEmpty, produced) = writer.terminator(&mut buf) else {
            panic!("csv terminator did not fit the escape buffer");
        };
        self.io.write_all(&buf[..produced]).map_err(|e| self.write_error(e))
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.args.output {
            None => Error::WriteStdout(e),
            Some(path) => Error::WriteFile(e, path.clone()),
        }
    }

    pub fn commit(mut self) -> Result<(), Error> {
        if let Shape::Table(table) = &self.shape {
            self.io.write_fmt(format_args!("{table}\n")).map_err(|e| self.write_error(e))?;
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}
