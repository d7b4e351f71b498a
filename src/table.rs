use crate::flatten::MARKER_KEY;
use crate::models::{ImageRecord, JoinedRow, OutputRow, ProductRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("missing required column `{column}` in {path}")]
    MissingColumn { column: &'static str, path: String },
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn csv_err(path: &Path, source: csv::Error) -> TableError {
    TableError::Csv {
        path: path.display().to_string(),
        source,
    }
}

pub fn load_products(path: &Path) -> Result<Vec<ProductRecord>, TableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| csv_err(path, err))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| csv_err(path, err))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    for column in ["sku", "name"] {
        if !headers.iter().any(|h| h == column) {
            return Err(TableError::MissingColumn {
                column,
                path: path.display().to_string(),
            });
        }
    }

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_err(path, err))?;
        let mut fields: BTreeMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.to_string()))
            .collect();
        let sku = fields.remove("sku").unwrap_or_default();
        // the channel column does not survive the join
        fields.remove("channel");
        if sku.trim().is_empty() {
            continue;
        }
        products.push(ProductRecord { sku, fields });
    }
    Ok(products)
}

pub fn load_images(path: &Path) -> Result<Vec<ImageRecord>, TableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| csv_err(path, err))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| csv_err(path, err))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let index_of = |column: &'static str| -> Result<usize, TableError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or(TableError::MissingColumn {
                column,
                path: path.display().to_string(),
            })
    };
    let sku_idx = index_of("sku")?;
    let url_idx = index_of("url")?;
    let main_idx = index_of("is_main_image")?;

    let mut images = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_err(path, err))?;
        images.push(ImageRecord {
            sku: record.get(sku_idx).unwrap_or("").trim().to_string(),
            url: record.get(url_idx).unwrap_or("").trim().to_string(),
            is_main_image: truthy(record.get(main_idx).unwrap_or("")),
        });
    }
    Ok(images)
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "t"
    )
}

/// Inner join on `sku` against the main-image rows. Products without a
/// main image are dropped; the first main image wins when a product has
/// several. Returns the joined rows plus the dropped-product count.
pub fn join_main_images(
    products: Vec<ProductRecord>,
    images: &[ImageRecord],
) -> (Vec<JoinedRow>, usize) {
    let mut main_by_sku: HashMap<&str, &ImageRecord> = HashMap::new();
    for image in images.iter().filter(|image| image.is_main_image) {
        main_by_sku.entry(image.sku.as_str()).or_insert(image);
    }

    let total = products.len();
    let rows: Vec<JoinedRow> = products
        .into_iter()
        .filter_map(|product| {
            let image = main_by_sku.get(product.sku.as_str())?;
            Some(JoinedRow {
                sku: product.sku,
                url: image.url.clone(),
                fields: product.fields,
            })
        })
        .collect();
    let dropped = total - rows.len();
    (rows, dropped)
}

/// Write the output table: `sku`, `url`, then the union of flattened spec
/// columns in sorted order, with `JSON-LD_Marker` last. Rows missing a
/// column are padded with empty strings so the output is always
/// rectangular regardless of which rows failed to flatten.
pub fn write_output(path: &Path, rows: &[OutputRow]) -> Result<(), TableError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| TableError::Io {
            path: parent.display().to_string(),
            source: err,
        })?;
    }

    let spec_columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.flat.columns.iter().map(|(name, _)| name.as_str()))
        .collect();

    let mut writer = csv::Writer::from_path(path).map_err(|err| csv_err(path, err))?;
    let mut header = vec!["sku", "url"];
    header.extend(spec_columns.iter().copied());
    header.push(MARKER_KEY);
    writer
        .write_record(&header)
        .map_err(|err| csv_err(path, err))?;

    for row in rows {
        let mut record = vec![row.sku.as_str(), row.url.as_str()];
        for column in &spec_columns {
            record.push(row.flat.get(column).unwrap_or(""));
        }
        record.push(row.flat.marker.as_str());
        writer
            .write_record(&record)
            .map_err(|err| csv_err(path, err))?;
    }
    writer.flush().map_err(|err| TableError::Io {
        path: path.display().to_string(),
        source: err,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlatRow;

    fn product(sku: &str, name: &str) -> ProductRecord {
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), name.into());
        ProductRecord {
            sku: sku.into(),
            fields,
        }
    }

    fn image(sku: &str, url: &str, main: bool) -> ImageRecord {
        ImageRecord {
            sku: sku.into(),
            url: url.into(),
            is_main_image: main,
        }
    }

    #[test]
    fn join_keeps_only_products_with_a_main_image() {
        let products = vec![product("123", "A"), product("456", "B")];
        let images = vec![
            image("123", "https://img/secondary.jpg", false),
            image("123", "https://img/main.jpg", true),
            image("456", "https://img/not-main.jpg", false),
        ];
        let (rows, dropped) = join_main_images(products, &images);
        assert_eq!(rows.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(rows[0].sku, "123");
        assert_eq!(rows[0].url, "https://img/main.jpg");
    }

    #[test]
    fn join_takes_first_main_image_when_several() {
        let products = vec![product("123", "A")];
        let images = vec![
            image("123", "https://img/first.jpg", true),
            image("123", "https://img/second.jpg", true),
        ];
        let (rows, _) = join_main_images(products, &images);
        assert_eq!(rows[0].url, "https://img/first.jpg");
    }

    #[test]
    fn load_products_drops_channel_and_keeps_extras() {
        let dir = std::env::temp_dir().join("seosheet-test-products");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("products.csv");
        std::fs::write(
            &path,
            "sku,name,channel,price,category\n123,Botas,web,59.95,calzado\n",
        )
        .unwrap();

        let products = load_products(&path).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].sku, "123");
        assert_eq!(
            products[0].fields.get("name").map(String::as_str),
            Some("Botas")
        );
        assert!(!products[0].fields.contains_key("channel"));
        assert_eq!(products[0].fields.get("price").map(String::as_str), Some("59.95"));
        assert_eq!(
            products[0].fields.get("category").map(String::as_str),
            Some("calzado")
        );
    }

    #[test]
    fn load_products_requires_sku_column() {
        let dir = std::env::temp_dir().join("seosheet-test-products-bad");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("products.csv");
        std::fs::write(&path, "name,channel\nBotas,web\n").unwrap();

        let err = load_products(&path).expect_err("should fail");
        assert!(err.to_string().contains("sku"));
    }

    #[test]
    fn write_output_pads_to_column_union() {
        let dir = std::env::temp_dir().join("seosheet-test-output");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let rows = vec![
            OutputRow {
                sku: "1".into(),
                url: "https://img/a.jpg".into(),
                flat: FlatRow {
                    columns: vec![
                        ("SEO_Title".into(), "Uno".into()),
                        ("Extra".into(), "x".into()),
                    ],
                    marker: r#"{"@type":"Product"}"#.into(),
                },
            },
            OutputRow {
                sku: "2".into(),
                url: "https://img/b.jpg".into(),
                flat: FlatRow::empty(),
            },
        ];
        write_output(&path, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next().unwrap(), "sku,url,Extra,SEO_Title,JSON-LD_Marker");
        let first = lines.next().unwrap();
        assert!(first.starts_with("1,https://img/a.jpg,x,Uno,"));
        let second = lines.next().unwrap();
        assert_eq!(second, "2,https://img/b.jpg,,,{}");
    }
}
