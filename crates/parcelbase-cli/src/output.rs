//! Table/JSON rendering of service results.

use serde_json::Value;
use tabled::{Table, Tabled};

use parcelbase_core::{AuditLog, Document, PackageWithProcessing, Profile};

#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Tracking")]
    tracking_number: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Shipped")]
    shipping_date: String,
    #[tabled(rename = "Processing")]
    processing: String,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Active")]
    is_active: bool,
}

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Type")]
    file_type: String,
    #[tabled(rename = "Size")]
    file_size: u64,
}

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "When")]
    created_at: String,
    #[tabled(rename = "Table")]
    table_name: String,
    #[tabled(rename = "Op")]
    operation: String,
    #[tabled(rename = "User")]
    user_id: String,
}

pub fn print_packages(packages: &[PackageWithProcessing]) {
    let rows = packages.iter().map(|p| PackageRow {
        id: p.package.id.to_string(),
        tracking_number: p.package.tracking_number.clone(),
        status: p.package.status.to_string(),
        priority: p.package.priority_level.to_string(),
        shipping_date: p.package.shipping_date.to_string(),
        processing: p
            .package_processing
            .as_ref()
            .map(|record| record.tracking_number_confirmation.to_string())
            .unwrap_or_else(|| "-".to_string()),
    });
    println!("{}", Table::new(rows));
}

pub fn print_profiles(profiles: &[Profile]) {
    let rows = profiles.iter().map(|p| ProfileRow {
        id: p.id.clone(),
        email: p.email.clone(),
        full_name: p.full_name.clone().unwrap_or_else(|| "-".to_string()),
        role: p.role.to_string(),
        is_active: p.is_active,
    });
    println!("{}", Table::new(rows));
}

pub fn print_documents(documents: &[Document]) {
    let rows = documents.iter().map(|d| DocumentRow {
        id: d.id.to_string(),
        file_name: d.file_name.clone(),
        file_type: d.file_type.clone(),
        file_size: d.file_size,
    });
    println!("{}", Table::new(rows));
}

pub fn print_audit_logs(entries: &[AuditLog]) {
    let rows = entries.iter().map(|e| AuditRow {
        created_at: e.created_at.to_string(),
        table_name: e.table_name.clone(),
        operation: e.operation.to_string(),
        user_id: e.user_id.clone(),
    });
    println!("{}", Table::new(rows));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_value(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
