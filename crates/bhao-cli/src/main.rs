use anyhow::{bail, Context, Result};
use bhao_core::{build_filter, Document, Product, SearchRequest, PRODUCT_COLLECTION, SEARCH_LIMIT};
use bhao_storage::{DocumentStore, InMemoryStore, StoreUrl};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bhao")]
#[command(about = "BHAO.PK catalog admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct Target {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    #[arg(long, env = "DATABASE_NAME")]
    database_name: String,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate products from a JSON array or JSON-lines file and append them.
    Import {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = PRODUCT_COLLECTION)]
        collection: String,
        file: String,
    },
    /// Run a product search against the database and print the response.
    Search {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "")]
        q: String,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// Print the collection names.
    Collections {
        #[command(flatten)]
        target: Target,
    },
}

impl Target {
    fn open(&self, create: bool) -> Result<InMemoryStore> {
        let url: StoreUrl = self.database_url.parse()?;
        Ok(url.open(&self.database_name, create)?)
    }
}

fn parse_records(text: &str) -> Result<Vec<Value>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    let mut out = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(line).with_context(|| format!("line {}", n + 1))?);
    }
    Ok(out)
}

fn validate_products(records: Vec<Value>) -> Result<Vec<Product>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value::<Product>(v).with_context(|| format!("record {}", i + 1))
        })
        .collect()
}

async fn import(target: &Target, collection: &str, file: &str) -> Result<Value> {
    let url: StoreUrl = target.database_url.parse()?;
    if url == StoreUrl::Memory {
        bail!("import needs a file-backed database, got {}", target.database_url);
    }
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
    let products = validate_products(parse_records(&text)?)?;
    let store = target.open(true)?;
    for p in products.iter().cloned() {
        store.insert(collection, p.into_fields()).await?;
    }
    store.flush_collection(collection)?;
    Ok(json!({
        "collection": collection,
        "inserted": products.len(),
        "total": store.count(collection),
    }))
}

/// Builds the request the server would deserialize, so prices get the same
/// validation.
fn search_request(q: String, min_price: Option<f64>, max_price: Option<f64>) -> Result<SearchRequest> {
    serde_json::from_value(json!({
        "q": q,
        "min_price": min_price,
        "max_price": max_price,
    }))
    .context("invalid search flags")
}

async fn collections(target: &Target) -> Result<Value> {
    Ok(json!(target.open(false)?.list_collection_names().await?))
}

async fn search(store: &InMemoryStore, req: &SearchRequest) -> Result<Value> {
    let filter = build_filter(req);
    let docs = store.find(PRODUCT_COLLECTION, &filter, SEARCH_LIMIT).await?;
    let items: Vec<_> = docs.into_iter().map(Document::into_transport).collect();
    Ok(json!({ "items": items }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let out = match cli.cmd {
        Cmd::Import {
            target,
            collection,
            file,
        } => import(&target, &collection, &file).await?,
        Cmd::Search {
            target,
            q,
            min_price,
            max_price,
        } => {
            let req = search_request(q, min_price, max_price)?;
            search(&target.open(false)?, &req).await?
        }
        Cmd::Collections { target } => collections(&target).await?,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_and_lines() {
        let arr = parse_records(r#"[{"title": "a", "price": 1}, {"title": "b", "price": 2}]"#)
            .unwrap();
        assert_eq!(arr.len(), 2);
        let lines = parse_records("{\"title\": \"a\", \"price\": 1}\n\n{\"title\": \"b\", \"price\": 2}\n")
            .unwrap();
        assert_eq!(lines, arr);
        let err = parse_records("{\"title\": \"a\"}\n{oops").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn rejects_records_without_price() {
        let recs = parse_records(r#"[{"title": "a", "price": 1}, {"title": "b"}]"#).unwrap();
        let err = validate_products(recs).unwrap_err();
        assert!(format!("{:#}", err).contains("record 2"));
    }

    #[tokio::test]
    async fn import_then_search() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("products.json");
        std::fs::write(
            &input,
            r#"[{"title": "Smartphone X", "price": 45000, "store": "daraz"},
                {"title": "Kettle", "price": 2500}]"#,
        )
        .unwrap();
        let target = Target {
            database_url: format!("file://{}", base.path().display()),
            database_name: "bhao".into(),
        };
        let report = import(&target, "product", input.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(report["inserted"], 2);
        assert_eq!(report["total"], 2);

        let req = SearchRequest {
            q: Some("phone".into()),
            ..Default::default()
        };
        let out = search(&target.open(false).unwrap(), &req).await.unwrap();
        let items = out["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["store"], "daraz");
        assert!(items[0]["_id"].is_string());
        assert!(items[0]["created_at"].is_string());
    }

    fn parse_search(args: &[&str]) -> SearchRequest {
        let mut argv = vec!["bhao", "search", "--database-url", "memory://", "--database-name", "bhao"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().cmd {
            Cmd::Search {
                q,
                min_price,
                max_price,
                ..
            } => search_request(q, min_price, max_price).unwrap(),
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn search_flags_become_request() {
        let req = parse_search(&["--q", "phone", "--min-price", "100", "--max-price", "500"]);
        assert_eq!(req.query(), "phone");
        assert_eq!(req.min_price, Some(100.0));
        assert_eq!(req.max_price, Some(500.0));
        assert_eq!(req.sort.as_deref(), Some("value"));

        let req = parse_search(&[]);
        assert_eq!(req.query(), "");
        assert!(req.min_price.is_none() && req.max_price.is_none());
    }

    #[test]
    fn negative_price_flag_is_an_error() {
        let cli = Cli::try_parse_from([
            "bhao",
            "search",
            "--database-url",
            "memory://",
            "--database-name",
            "bhao",
            "--min-price=-5",
        ])
        .unwrap();
        let Cmd::Search {
            q,
            min_price,
            max_price,
            ..
        } = cli.cmd
        else {
            panic!("expected search");
        };
        assert_eq!(min_price, Some(-5.0));
        let err = search_request(q, min_price, max_price).unwrap_err();
        assert!(format!("{:#}", err).contains("non-negative"));
    }

    #[tokio::test]
    async fn collections_lists_imported_names() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("products.json");
        std::fs::write(&input, r#"[{"title": "Kettle", "price": 2500}]"#).unwrap();
        let target = Target {
            database_url: format!("file://{}", base.path().display()),
            database_name: "bhao".into(),
        };
        assert!(collections(&target).await.is_err());

        let input = input.to_str().unwrap();
        import(&target, "product", input).await.unwrap();
        import(&target, "deals", input).await.unwrap();
        assert_eq!(collections(&target).await.unwrap(), json!(["deals", "product"]));
    }

    #[tokio::test]
    async fn import_keeps_unreadable_records() {
        let base = tempfile::tempdir().unwrap();
        let db = base.path().join("bhao");
        std::fs::create_dir(&db).unwrap();
        let existing = db.join("product.jsonl.zst");
        let legacy = "{\"_id\": \"507f1f77bcf86cd799439011\", \"title\": \"Legacy\", \"price\": 10}\n";
        std::fs::write(&existing, zstd::encode_all(legacy.as_bytes(), 3).unwrap()).unwrap();
        let input = base.path().join("products.json");
        std::fs::write(&input, r#"[{"title": "Kettle", "price": 2500}]"#).unwrap();
        let target = Target {
            database_url: format!("file://{}", base.path().display()),
            database_name: "bhao".into(),
        };

        let err = import(&target, "product", input.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("corrupt collection file"));
        let raw = zstd::decode_all(std::fs::File::open(&existing).unwrap()).unwrap();
        assert_eq!(raw, legacy.as_bytes());
    }

    #[tokio::test]
    async fn import_refuses_memory_database() {
        let target = Target {
            database_url: "memory://".into(),
            database_name: "bhao".into(),
        };
        assert!(import(&target, "product", "unused.json").await.is_err());
    }
}
