//! CSV imports into a workspace.
//!
//! Each import reads and validates the whole file before the first mutation,
//! then applies rows in file order, pausing between rows. The first failing
//! mutation stops the import.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use cycle::{CompanyUpdate, Customer, CustomerUpdate, ExternalCompanyIds, NewFeedback};
use domain::{CompanyId, ExecutionError, PageSize, WorkspaceId};
use paging::PageCollector;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::Context;

/// Page size used when listing a workspace to match rows against it.
const LISTING_PAGE_SIZE: u32 = 100;

#[derive(Debug, Subcommand)]
pub enum ImportTarget {
    /// Create one feedback document per row.
    ///
    /// Columns: `title`, `content` (HTML), `email`, `company`.
    Feedback {
        file: std::path::PathBuf,

        /// Source link stored on each document. Defaults to the workspace URL.
        #[arg(long)]
        source_url: Option<String>,

        #[command(flatten)]
        pacing: Pacing,
    },

    /// Create missing companies and update their attributes.
    ///
    /// Columns: `name`, `domain`, `arr`, `employees`, `zendesk_id`,
    /// `hubspot_id`, `intercom_id`, `pipedrive_id`, `snowflake_id`, `custom_id`.
    Companies {
        file: std::path::PathBuf,

        #[command(flatten)]
        pacing: Pacing,
    },

    /// Update existing customers, matched by email.
    ///
    /// Columns: `email`, `name`, `company`. A company that does not exist
    /// yet is created.
    Customers {
        file: std::path::PathBuf,

        /// Delete the listed customers instead of updating them.
        #[arg(long)]
        delete: bool,

        #[command(flatten)]
        pacing: Pacing,
    },
}

impl ImportTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Feedback { .. } => "feedback",
            Self::Companies { .. } => "companies",
            Self::Customers { .. } => "customers",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct Pacing {
    /// Pause between rows in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub row_delay_ms: u64,
}

impl Pacing {
    fn delay(&self) -> Duration {
        Duration::from_millis(self.row_delay_ms)
    }
}

/// What an import did, row by row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct FeedbackRow {
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompanyRow {
    name: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    arr: Option<f64>,
    #[serde(default)]
    employees: Option<u32>,
    #[serde(default)]
    zendesk_id: Option<String>,
    #[serde(default)]
    hubspot_id: Option<String>,
    #[serde(default)]
    intercom_id: Option<String>,
    #[serde(default)]
    pipedrive_id: Option<String>,
    #[serde(default)]
    snowflake_id: Option<String>,
    #[serde(default)]
    custom_id: Option<String>,
}

impl CompanyRow {
    fn update(&self) -> CompanyUpdate {
        CompanyUpdate {
            name: None,
            domain: self.domain.clone(),
            arr: self.arr,
            number_of_employees: self.employees,
            external_ids: ExternalCompanyIds {
                zendesk: self.zendesk_id.clone(),
                hubspot: self.hubspot_id.clone(),
                intercom: self.intercom_id.clone(),
                pipedrive: self.pipedrive_id.clone(),
                snowflake: self.snowflake_id.clone(),
                custom: self.custom_id.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    company: Option<String>,
}

pub async fn run(ctx: &Context, target: &ImportTarget) -> anyhow::Result<ImportSummary> {
    match target {
        ImportTarget::Feedback {
            file,
            source_url,
            pacing,
        } => feedback(ctx, file, source_url.as_deref(), pacing.delay()).await,
        ImportTarget::Companies { file, pacing } => companies(ctx, file, pacing.delay()).await,
        ImportTarget::Customers {
            file,
            delete: true,
            pacing,
        } => delete_customers(ctx, file, pacing.delay()).await,
        ImportTarget::Customers {
            file,
            delete: false,
            pacing,
        } => customers(ctx, file, pacing.delay()).await,
    }
}

async fn feedback(
    ctx: &Context,
    file: &Path,
    source_url: Option<&str>,
    delay: Duration,
) -> anyhow::Result<ImportSummary> {
    let rows: Vec<FeedbackRow> = read_rows(file)?;
    let slug = ctx.config.workspace_slug()?;
    let workspace = ctx.workspace_id().await?;
    let source_url = source_url
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://product.cycle.app/app/{slug}"));
    info!(rows = rows.len(), "importing feedback");

    let mut summary = ImportSummary::default();
    for (index, row) in rows.into_iter().enumerate() {
        pace(ctx, index, delay).await?;
        if row.title.is_empty() {
            warn!(line = line_of(index), "row has no title; skipped");
            summary.skipped += 1;
            continue;
        }
        let feedback = NewFeedback {
            title: row.title,
            content: row.content,
            source_url: source_url.clone(),
            company_name: row.company,
            customer_email: row.email,
        };
        let created = ctx
            .client
            .create_feedback(&workspace, &feedback)
            .await
            .with_context(|| {
                format!("line {}: cannot create feedback '{}'", line_of(index), feedback.title)
            })?;
        debug!(doc = %created.id, "feedback imported");
        summary.created += 1;
    }
    Ok(summary)
}

async fn companies(ctx: &Context, file: &Path, delay: Duration) -> anyhow::Result<ImportSummary> {
    let rows: Vec<CompanyRow> = read_rows(file)?;
    let workspace = ctx.workspace_id().await?;
    let mut index = company_index(ctx, &workspace).await?;
    info!(rows = rows.len(), known = index.len(), "importing companies");

    let mut summary = ImportSummary::default();
    for (position, row) in rows.iter().enumerate() {
        pace(ctx, position, delay).await?;
        if row.name.is_empty() {
            warn!(line = line_of(position), "row has no company name; skipped");
            summary.skipped += 1;
            continue;
        }
        let (company, created) = find_or_create_company(ctx, &workspace, &mut index, &row.name)
            .await
            .with_context(|| format!("line {}: cannot create '{}'", line_of(position), row.name))?;
        if created {
            summary.created += 1;
        }

        let update = row.update();
        if update.is_empty() {
            if !created {
                summary.unchanged += 1;
            }
            continue;
        }
        ctx.client
            .update_company(&company, &update)
            .await
            .with_context(|| format!("line {}: cannot update '{}'", line_of(position), row.name))?;
        if !created {
            summary.updated += 1;
        }
    }
    Ok(summary)
}

async fn customers(ctx: &Context, file: &Path, delay: Duration) -> anyhow::Result<ImportSummary> {
    let rows: Vec<CustomerRow> = read_rows(file)?;
    let workspace = ctx.workspace_id().await?;
    let known = customer_index(ctx, &workspace).await?;
    let mut companies = if rows.iter().any(|row| row.company.is_some()) {
        company_index(ctx, &workspace).await?
    } else {
        HashMap::new()
    };
    info!(rows = rows.len(), known = known.len(), "importing customers");

    let mut summary = ImportSummary::default();
    for (position, row) in rows.iter().enumerate() {
        pace(ctx, position, delay).await?;
        let Some(customer) = known.get(&key(&row.email)) else {
            warn!(line = line_of(position), email = %row.email, "no customer with that email; skipped");
            summary.skipped += 1;
            continue;
        };

        let mut update = CustomerUpdate {
            name: row.name.clone().filter(|name| customer.name.as_ref() != Some(name)),
            ..CustomerUpdate::default()
        };
        if let Some(company_name) = &row.company {
            let (company, _) =
                find_or_create_company(ctx, &workspace, &mut companies, company_name)
                    .await
                    .with_context(|| {
                        format!("line {}: cannot create '{company_name}'", line_of(position))
                    })?;
            let current = customer.company.as_ref().map(|company| &company.id);
            if current != Some(&company) {
                update.company = Some(company);
            }
        }

        if update.is_empty() {
            summary.unchanged += 1;
            continue;
        }
        ctx.client
            .update_customer(&customer.id, &update)
            .await
            .with_context(|| format!("line {}: cannot update {}", line_of(position), row.email))?;
        summary.updated += 1;
    }
    Ok(summary)
}

async fn delete_customers(
    ctx: &Context,
    file: &Path,
    delay: Duration,
) -> anyhow::Result<ImportSummary> {
    let rows: Vec<CustomerRow> = read_rows(file)?;
    let workspace = ctx.workspace_id().await?;
    info!(rows = rows.len(), "deleting customers");

    let mut summary = ImportSummary::default();
    for (position, row) in rows.iter().enumerate() {
        pace(ctx, position, delay).await?;
        let found = ctx
            .client
            .customer_by_email(&workspace, &row.email)
            .await
            .with_context(|| format!("line {}: cannot look up {}", line_of(position), row.email))?;
        let Some(customer) = found else {
            warn!(line = line_of(position), email = %row.email, "no customer with that email; skipped");
            summary.skipped += 1;
            continue;
        };
        ctx.client
            .delete_customer(&customer.id)
            .await
            .with_context(|| format!("line {}: cannot delete {}", line_of(position), row.email))?;
        summary.deleted += 1;
    }
    Ok(summary)
}

/// Every company of the workspace keyed by its normalized name. The first
/// company listed wins when names collide.
async fn company_index(
    ctx: &Context,
    workspace: &WorkspaceId,
) -> anyhow::Result<HashMap<String, CompanyId>> {
    let client = &ctx.client;
    let size = PageSize::new(LISTING_PAGE_SIZE).unwrap_or_default();
    let companies = PageCollector::new(
        move |cursor| client.companies_page(workspace, cursor, size, None),
        ctx.collector_options(),
    )
    .collect_all()
    .await
    .context("cannot list the workspace's companies")?;

    let mut index = HashMap::with_capacity(companies.len());
    for company in companies {
        index.entry(key(&company.name)).or_insert(company.id);
    }
    Ok(index)
}

/// Every customer with an email, keyed by the normalized email.
async fn customer_index(
    ctx: &Context,
    workspace: &WorkspaceId,
) -> anyhow::Result<HashMap<String, Customer>> {
    let client = &ctx.client;
    let size = PageSize::new(LISTING_PAGE_SIZE).unwrap_or_default();
    let customers = PageCollector::new(
        move |cursor| client.customers_page(workspace, cursor, size, None),
        ctx.collector_options(),
    )
    .collect_all()
    .await
    .context("cannot list the workspace's customers")?;

    let mut index = HashMap::with_capacity(customers.len());
    for customer in customers {
        if let Some(email) = customer.email.as_deref().map(key) {
            index.entry(email).or_insert(customer);
        }
    }
    Ok(index)
}

async fn find_or_create_company(
    ctx: &Context,
    workspace: &WorkspaceId,
    index: &mut HashMap<String, CompanyId>,
    name: &str,
) -> Result<(CompanyId, bool), ExecutionError> {
    if let Some(id) = index.get(&key(name)) {
        return Ok((id.clone(), false));
    }
    let company = ctx.client.create_company(workspace, name).await?;
    info!(company = %company.id, name, "company created");
    index.insert(key(name), company.id.clone());
    Ok((company.id, true))
}

fn read_rows<R: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<R>, _>>()
        .with_context(|| format!("{} is not a valid import file", path.display()))
}

async fn pace(ctx: &Context, position: usize, delay: Duration) -> Result<(), ExecutionError> {
    if ctx.cancellation.is_cancelled() {
        return Err(ExecutionError::Cancelled);
    }
    if position == 0 || delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        () = ctx.cancellation.cancelled() => Err(ExecutionError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

fn key(value: &str) -> String {
    value.trim().to_lowercase()
}

// Header is line 1.
fn line_of(position: usize) -> usize {
    position + 2
}
