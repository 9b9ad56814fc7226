use affordability::{
    document::csv_export::load_csv,
    extract::{extract_point_estimates, normalize, DiscoveryRules},
};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a census CSV export.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <CSV_EXPORT>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_table(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print the row the default rules pick and each geography's estimate.
fn inspect_table(path: &Path) -> anyhow::Result<()> {
    let doc = load_csv(path)?;
    let rules = DiscoveryRules::default();
    let est = extract_point_estimates(&doc, &rules)?;

    println!("=== Export: {} ===", path.display());
    println!("Columns:              {}", doc.headers.len());
    println!("Data rows:            {}", doc.row_count());
    let label = doc
        .column_index(&rules.label_column)
        .map(|c| doc.cell(est.row.index, c).as_text())
        .unwrap_or_default();
    println!(
        "Row:                  {} {:?}{}",
        est.row.index,
        label.trim(),
        if est.row.matched { "" } else { " (fallback)" }
    );
    println!();

    for (geo, cell) in &est.values {
        match normalize(cell) {
            Ok(Some(v)) => println!("  {:<45} {}", geo, v),
            Ok(None) => println!("  {:<45} <missing>", geo),
            Err(e) => println!("  {:<45} <{}>", geo, e),
        }
    }
    Ok(())
}
