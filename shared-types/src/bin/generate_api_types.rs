use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the web app
    let mut types = Vec::new();

    // Transaction types
    types.push(clean_type(Transaction::export_to_string()?));
    types.push(clean_type(TransactionKind::export_to_string()?));
    types.push(clean_type(NewTransaction::export_to_string()?));
    types.push(clean_type(CreateTransactionResponse::export_to_string()?));
    types.push(clean_type(SuccessResponse::export_to_string()?));
    types.push(clean_type(TransactionFilter::export_to_string()?));

    // Report types
    types.push(clean_type(CategoryTotal::export_to_string()?));
    types.push(clean_type(MonthlyReport::export_to_string()?));
    types.push(clean_type(CategoryReport::export_to_string()?));

    // Family types
    types.push(clean_type(Family::export_to_string()?));
    types.push(clean_type(FamilyMember::export_to_string()?));
    types.push(clean_type(FamilyRequest::export_to_string()?));
    types.push(clean_type(FamilyResponse::export_to_string()?));

    // Sync types
    types.push(clean_type(SyncRequest::export_to_string()?));
    types.push(clean_type(SyncUpdates::export_to_string()?));
    types.push(clean_type(SyncResponse::export_to_string()?));

    // Budget, category and notification types
    types.push(clean_type(Budget::export_to_string()?));
    types.push(clean_type(Category::export_to_string()?));
    types.push(clean_type(Notification::export_to_string()?));

    types.push(clean_type(ErrorResponse::export_to_string()?));
    types.push(clean_type(HealthResponse::export_to_string()?));

    let output_dir = Path::new("../static/js/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
