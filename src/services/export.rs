use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, instrument};

use crate::{errors::ServiceError, repositories::DataStore};

const PRODUCT_HEADERS: [&str; 5] = ["id", "name", "category", "price", "created_at"];
const CUSTOMER_HEADERS: [&str; 5] = ["id", "name", "email", "phone", "created_at"];
const SALE_HEADERS: [&str; 6] = [
    "id",
    "product_id",
    "customer_id",
    "sale_date",
    "amount",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "txt" | "text" => Ok(ExportFormat::Txt),
            other => Err(ServiceError::InvalidInput(format!(
                "Unknown export format '{}'; expected csv or txt",
                other
            ))),
        }
    }
}

fn write_csv_section<W: Write, T: Serialize>(
    out: &mut W,
    title: &str,
    headers: &[&str],
    rows: &[T],
) -> Result<(), ServiceError> {
    writeln!(out, "=== {} ===", title)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&mut *out);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_txt_section<W: Write, T: Serialize>(
    out: &mut W,
    title: &str,
    rows: &[T],
) -> Result<(), ServiceError> {
    writeln!(out, "{}:", title)?;
    for row in rows {
        writeln!(out, "{}", serde_json::to_string(row)?)?;
    }
    Ok(())
}

/// Writes all three tables as CSV sections. Returns the number of rows written.
#[instrument(skip(store, out))]
pub async fn export_csv<W: Write>(
    store: &dyn DataStore,
    out: &mut W,
) -> Result<usize, ServiceError> {
    let products = store.list_products().await?;
    let customers = store.list_customers().await?;
    let sales = store.list_sales().await?;

    write_csv_section(out, "PRODUCTS", &PRODUCT_HEADERS, &products)?;
    writeln!(out)?;
    write_csv_section(out, "CUSTOMERS", &CUSTOMER_HEADERS, &customers)?;
    writeln!(out)?;
    write_csv_section(out, "SALES", &SALE_HEADERS, &sales)?;

    Ok(products.len() + customers.len() + sales.len())
}

/// Writes all three tables as a plain listing, one JSON object per record.
#[instrument(skip(store, out))]
pub async fn export_txt<W: Write>(
    store: &dyn DataStore,
    out: &mut W,
) -> Result<usize, ServiceError> {
    let products = store.list_products().await?;
    let customers = store.list_customers().await?;
    let sales = store.list_sales().await?;

    write_txt_section(out, "PRODUCTS", &products)?;
    writeln!(out)?;
    write_txt_section(out, "CUSTOMERS", &customers)?;
    writeln!(out)?;
    write_txt_section(out, "SALES", &sales)?;

    Ok(products.len() + customers.len() + sales.len())
}

/// Exports to a new file at `path`, replacing any existing file.
#[instrument(skip(store, path), fields(path = %path.as_ref().display()))]
pub async fn export_to_path<P: AsRef<Path>>(
    store: &dyn DataStore,
    format: ExportFormat,
    path: P,
) -> Result<usize, ServiceError> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    let rows = match format {
        ExportFormat::Csv => export_csv(store, &mut out).await?,
        ExportFormat::Txt => export_txt(store, &mut out).await?,
    };
    out.flush()?;

    info!(rows, %format, "Data exported");
    Ok(rows)
}
