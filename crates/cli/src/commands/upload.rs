use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use brewbot_agent::embedder::{EmbeddingClient, OpenAiEmbedder};
use brewbot_agent::index::{PineconeIndex, UpsertRecord, VectorIndex};
use brewbot_core::catalog::CatalogRecord;
use brewbot_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

const EXPECTED_COLUMNS: [&str; 7] =
    ["id", "name", "price", "category", "description", "stock", "available"];

// Rate limiting lives here, in the batch tool; the live pipeline has none.
const ITEM_DELAY_MS: u64 = 100;
const BATCH_DELAY_MS: u64 = 500;

pub fn run(file: &Path, batch_size: usize, dry_run: bool) -> CommandResult {
    if batch_size == 0 {
        return CommandResult {
            exit_code: 2,
            output: "upload failed: --batch-size must be greater than zero".to_string(),
        };
    }

    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("upload failed: could not read `{}`: {error}", file.display()),
            }
        }
    };

    let records = match parse_csv(&content) {
        Ok(records) => records,
        Err(error) => {
            return CommandResult { exit_code: 1, output: format!("upload failed: {error}") }
        }
    };

    let mut lines =
        vec![format!("parsed {} catalog records from `{}`", records.len(), file.display())];
    for record in records.iter().take(3) {
        lines.push(format!("  - {} ({}): ${}", record.name, record.category, record.price));
    }

    if dry_run {
        lines.push("dry run: vector index untouched".to_string());
        return CommandResult { exit_code: 0, output: lines.join("\n") };
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult { exit_code: 1, output: format!("upload failed: {error}") }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("upload failed: could not initialize async runtime: {error}"),
            }
        }
    };

    match runtime.block_on(upload_records(&config, &records, batch_size, &mut lines)) {
        Ok(uploaded) => {
            lines.push(format!(
                "uploaded {uploaded} vectors to index `{}`",
                config.pinecone.index_name
            ));
            CommandResult { exit_code: 0, output: lines.join("\n") }
        }
        Err(error) => {
            lines.push(format!("upload failed: {error}"));
            CommandResult { exit_code: 1, output: lines.join("\n") }
        }
    }
}

async fn upload_records(
    config: &AppConfig,
    records: &[CatalogRecord],
    batch_size: usize,
    lines: &mut Vec<String>,
) -> Result<usize, String> {
    let embedder = OpenAiEmbedder::new(reqwest::Client::new(), &config.openai);
    let index = PineconeIndex::new(reqwest::Client::new(), &config.pinecone);

    // Ingestion needs a live index; unlike the serving path there is no
    // fallback worth writing to.
    index.ensure_ready().await.map_err(|error| error.to_string())?;

    let mut uploaded = 0usize;
    let batch_count = records.len().div_ceil(batch_size);

    for (batch_number, batch) in records.chunks(batch_size).enumerate() {
        let mut vectors = Vec::with_capacity(batch.len());
        for record in batch {
            match embedder.embed(&record.searchable_text()).await {
                Ok(values) => vectors.push(UpsertRecord {
                    id: record.id.clone(),
                    values,
                    metadata: record.metadata(),
                }),
                Err(error) => lines.push(format!("  ! skipped `{}`: {error}", record.name)),
            }
            tokio::time::sleep(Duration::from_millis(ITEM_DELAY_MS)).await;
        }

        if !vectors.is_empty() {
            uploaded += index.upsert(&vectors).await.map_err(|error| error.to_string())?;
        }
        lines.push(format!(
            "batch {}/{}: {} vectors upserted",
            batch_number + 1,
            batch_count,
            vectors.len()
        ));

        if batch_number + 1 < batch_count {
            tokio::time::sleep(Duration::from_millis(BATCH_DELAY_MS)).await;
        }
    }

    Ok(uploaded)
}

fn parse_csv(content: &str) -> Result<Vec<CatalogRecord>, String> {
    let mut rows = content.lines().map(str::trim_end).filter(|line| !line.trim().is_empty());

    let header = rows.next().ok_or_else(|| "csv file is empty".to_string())?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut positions = [0usize; EXPECTED_COLUMNS.len()];
    for (slot, name) in EXPECTED_COLUMNS.iter().enumerate() {
        positions[slot] = columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("csv header is missing the `{name}` column"))?;
    }
    let [id_at, name_at, price_at, category_at, description_at, stock_at, available_at] =
        positions;

    let mut records = Vec::new();
    for (line_number, row) in rows.enumerate() {
        let values: Vec<&str> = row.split(',').map(str::trim).collect();
        if values.len() != columns.len() {
            return Err(format!(
                "row {} has {} values but the header has {} columns",
                line_number + 2,
                values.len(),
                columns.len()
            ));
        }

        let price = Decimal::from_str(values[price_at]).map_err(|_| {
            format!("row {}: invalid price `{}`", line_number + 2, values[price_at])
        })?;
        let stock = values[stock_at].parse::<u32>().map_err(|_| {
            format!("row {}: invalid stock `{}`", line_number + 2, values[stock_at])
        })?;
        let available = match values[available_at].to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(format!("row {}: invalid available flag `{other}`", line_number + 2))
            }
        };

        records.push(CatalogRecord {
            id: values[id_at].to_owned(),
            name: values[name_at].to_owned(),
            price,
            category: values[category_at].to_owned(),
            description: values[description_at].to_owned(),
            stock,
            available,
        });
    }

    if records.is_empty() {
        return Err("csv file contains a header but no records".to_string());
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_csv, run};

    const SAMPLE: &str = "\
id,name,price,category,description,stock,available
latte-001,Creamy Latte,4.25,Coffee,Smooth espresso with steamed milk,30,true
muffin-001,Blueberry Muffin,2.75,Pastries,Fresh blueberry muffin,0,false
";

    #[test]
    fn well_formed_csv_parses_into_typed_records() {
        let records = parse_csv(SAMPLE).expect("sample should parse");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "latte-001");
        assert_eq!(records[0].price, Decimal::new(425, 2));
        assert!(records[0].available);
        assert_eq!(records[1].stock, 0);
        assert!(!records[1].available);
        assert_eq!(
            records[0].searchable_text(),
            "creamy latte coffee smooth espresso with steamed milk"
        );
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let error = parse_csv("id,name,price\nx,y,1.0\n").expect_err("should fail");
        assert!(error.contains("`category`"));
    }

    #[test]
    fn malformed_rows_are_reported_with_line_numbers() {
        let bad_price = SAMPLE.replace("4.25", "four");
        let error = parse_csv(&bad_price).expect_err("should fail");
        assert!(error.contains("row 2"));
        assert!(error.contains("invalid price"));

        let bad_flag = SAMPLE.replace("false", "maybe");
        let error = parse_csv(&bad_flag).expect_err("should fail");
        assert!(error.contains("invalid available flag"));
    }

    #[test]
    fn header_only_files_are_rejected() {
        let error = parse_csv("id,name,price,category,description,stock,available\n")
            .expect_err("should fail");
        assert!(error.contains("no records"));
    }

    #[test]
    fn dry_run_summarizes_without_touching_the_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inventory.csv");
        std::fs::write(&path, SAMPLE).expect("write");

        let result = run(&path, 10, true);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("parsed 2 catalog records"));
        assert!(result.output.contains("dry run: vector index untouched"));
    }

    #[test]
    fn zero_batch_size_is_rejected_up_front() {
        let result = run(std::path::Path::new("inventory.csv"), 0, true);
        assert_eq!(result.exit_code, 2);
    }
}
